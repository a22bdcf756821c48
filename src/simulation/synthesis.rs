//! Selection of the fragments a new rule is synthesized from

use crate::core::types::FragmentId;
use crate::entity::fragment::Fragment;

/// What the synthesizer sees and what the rule credits
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisWindow<'a> {
    /// Most recent fragments, oldest first
    pub fragments: &'a [Fragment],
    /// Ids of the most recent `sources` fragments of the window
    pub sources: Vec<FragmentId>,
}

/// `None` until at least `min_fragments` exist
pub fn synthesis_window(
    fragments: &[Fragment],
    min_fragments: usize,
    window: usize,
    sources: usize,
) -> Option<SynthesisWindow<'_>> {
    if fragments.is_empty() || fragments.len() < min_fragments {
        return None;
    }

    let shown = &fragments[fragments.len().saturating_sub(window)..];
    let credited = &shown[shown.len().saturating_sub(sources)..];

    Some(SynthesisWindow {
        fragments: shown,
        sources: credited.iter().map(|f| f.id.clone()).collect(),
    })
}
