//! Fragment analysis - ask the gateway to score and tag a fragment
//!
//! The reply is expected to be a JSON object, possibly wrapped in prose.
//! Anything unparseable degrades to a neutral analysis instead of failing.

use serde::Deserialize;

use crate::core::config::SamplingParams;
use crate::core::error::{NationError, Result};
use crate::llm::gateway::{ChatGateway, ChatMessage, ChatRequest};
use crate::llm::prompts::ANALYSIS_SYSTEM_PROMPT;

/// Strength and tags for one fragment
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FragmentAnalysis {
    pub strength: f32,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl FragmentAnalysis {
    /// Used when the gateway reply cannot be understood
    pub fn fallback(strength: f32) -> Self {
        Self {
            strength,
            tags: vec!["未知".into()],
        }
    }
}

/// Analyze fragment content. Only a gateway failure is an error.
pub async fn analyze_fragment(
    gateway: &dyn ChatGateway,
    content: &str,
    sampling: SamplingParams,
    fallback_strength: f32,
) -> Result<FragmentAnalysis> {
    let request = ChatRequest::new(
        vec![
            ChatMessage::system(ANALYSIS_SYSTEM_PROMPT),
            ChatMessage::user(content),
        ],
        sampling,
    );
    let response = gateway.chat(request).await?;
    Ok(parse_analysis(&response).unwrap_or_else(|_| FragmentAnalysis::fallback(fallback_strength)))
}

/// Parse an analysis reply; strength is clamped to [0, 1]
pub fn parse_analysis(response: &str) -> Result<FragmentAnalysis> {
    let json_str = extract_json(response)?;
    let mut analysis: FragmentAnalysis = serde_json::from_str(json_str).map_err(|e| {
        NationError::Gateway(format!("Failed to parse analysis: {} - Response: {}", e, response))
    })?;
    if !analysis.strength.is_finite() {
        return Err(NationError::Gateway("Analysis strength is not a number".into()));
    }
    analysis.strength = analysis.strength.clamp(0.0, 1.0);
    analysis.tags.retain(|t| !t.trim().is_empty());
    Ok(analysis)
}

/// Extract JSON object from LLM response (handles surrounding text)
fn extract_json(response: &str) -> Result<&str> {
    let start = response
        .find('{')
        .ok_or_else(|| NationError::Gateway("No JSON found in response".into()))?;
    let end = response
        .rfind('}')
        .ok_or_else(|| NationError::Gateway("No closing brace found in response".into()))?;
    if end < start {
        return Err(NationError::Gateway("Malformed JSON in response".into()));
    }
    Ok(&response[start..=end])
}
