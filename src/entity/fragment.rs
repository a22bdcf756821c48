//! Fragments of the ideal and the rules distilled from them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::types::{AgentId, FragmentId, RuleId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FragmentType {
    Value,
    /// Seed of a future rule
    #[serde(rename = "rule")]
    RuleSeed,
    Vision,
    Story,
}

impl FragmentType {
    pub const ALL: [FragmentType; 4] = [
        FragmentType::Value,
        FragmentType::RuleSeed,
        FragmentType::Vision,
        FragmentType::Story,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FragmentType::Value => "value",
            FragmentType::RuleSeed => "rule",
            FragmentType::Vision => "vision",
            FragmentType::Story => "story",
        }
    }

    /// Name used when prompting the personas
    pub fn label(&self) -> &'static str {
        match self {
            FragmentType::Value => "价值观",
            FragmentType::RuleSeed => "规则",
            FragmentType::Vision => "愿景",
            FragmentType::Story => "故事",
        }
    }
}

/// A piece of generated content attributed to one agent. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fragment {
    pub id: FragmentId,
    #[serde(rename = "type")]
    pub fragment_type: FragmentType,
    pub content: String,
    /// 0.0 - 1.0
    pub strength: f32,
    pub created_at: DateTime<Utc>,
    pub tags: Vec<String>,
    pub owner: AgentId,
    pub reasoning: String,
}

impl Fragment {
    pub fn new(
        owner: AgentId,
        fragment_type: FragmentType,
        content: impl Into<String>,
        strength: f32,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            id: FragmentId::generate(),
            fragment_type,
            content: content.into(),
            strength: strength.clamp(0.0, 1.0),
            created_at: Utc::now(),
            tags: Vec::new(),
            owner,
            reasoning: reasoning.into(),
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

/// A consensus statement synthesized from recent fragments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: RuleId,
    pub content: String,
    pub source_fragments: Vec<FragmentId>,
    /// 0.0 - 1.0
    pub consensus_score: f32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Rule {
    pub fn new(content: impl Into<String>, source_fragments: Vec<FragmentId>, consensus_score: f32) -> Self {
        Self {
            id: RuleId::generate(),
            content: content.into(),
            source_fragments,
            consensus_score: consensus_score.clamp(0.0, 1.0),
            active: true,
            created_at: Utc::now(),
        }
    }
}
