//! Content store - append-only log of fragments and rules

use crate::core::error::{NationError, Result};
use crate::core::types::FragmentId;
use crate::entity::fragment::{Fragment, Rule};

#[derive(Debug, Default)]
pub struct ContentStore {
    fragments: Vec<Fragment>,
    rules: Vec<Rule>,
}

impl ContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_fragment(&mut self, fragment: Fragment) {
        self.fragments.push(fragment);
    }

    /// Append a rule. Every source must already be stored.
    pub fn push_rule(&mut self, rule: Rule) -> Result<()> {
        if let Some(missing) = rule
            .source_fragments
            .iter()
            .find(|id| !self.contains_fragment(id))
        {
            return Err(NationError::FragmentNotFound(missing.clone()));
        }
        self.rules.push(rule);
        Ok(())
    }

    pub fn contains_fragment(&self, id: &FragmentId) -> bool {
        self.fragments.iter().any(|f| &f.id == id)
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::fragment::FragmentType;

    fn fragment(n: usize) -> Fragment {
        Fragment::new("twin-1".into(), FragmentType::Value, format!("f{}", n), 0.8, "r")
    }

    #[test]
    fn test_rule_with_unknown_source_rejected() {
        let mut store = ContentStore::new();
        store.push_fragment(fragment(0));
        let known = store.fragments()[0].id.clone();

        let bad = Rule::new("r", vec![known.clone(), FragmentId::from("frag-ghost")], 0.9);
        assert!(matches!(store.push_rule(bad), Err(NationError::FragmentNotFound(_))));
        assert!(store.rules().is_empty());

        store.push_rule(Rule::new("r", vec![known], 0.9)).unwrap();
        assert_eq!(store.rules().len(), 1);
    }
}
