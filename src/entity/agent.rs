//! Digital twin agents

use serde::{Deserialize, Serialize};

use crate::core::types::{AgentId, Vec3};

/// What an agent is visibly doing right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentAction {
    #[default]
    Idle,
    Walking,
    Thinking,
    Interacting,
    /// Shaping a fragment into the world
    Building,
}

impl AgentAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentAction::Idle => "idle",
            AgentAction::Walking => "walking",
            AgentAction::Thinking => "thinking",
            AgentAction::Interacting => "interacting",
            AgentAction::Building => "building",
        }
    }
}

/// An autonomous persona living in the nation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    pub position: Vec3,
    pub rotation: Vec3,
    pub action: AgentAction,
    /// Display color, e.g. `#4a90e2`
    pub color: String,
    pub personality: String,
    pub goals: Vec<String>,
    pub memories: Vec<String>,
}

impl Agent {
    pub fn new(id: impl Into<AgentId>, name: impl Into<String>, personality: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            action: AgentAction::Idle,
            color: "#ffffff".into(),
            personality: personality.into(),
            goals: Vec::new(),
            memories: Vec::new(),
        }
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn with_goals<I, S>(mut self, goals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.goals = goals.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_memories<I, S>(mut self, memories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.memories = memories.into_iter().map(Into::into).collect();
        self
    }

    /// Record a memory, evicting the oldest ones beyond `capacity`
    pub fn remember(&mut self, memory: impl Into<String>, capacity: usize) {
        if capacity == 0 {
            return;
        }
        self.memories.push(memory.into());
        if self.memories.len() > capacity {
            let excess = self.memories.len() - capacity;
            self.memories.drain(..excess);
        }
    }
}
