//! Conversations between pairs of agents

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::error::{NationError, Result};
use crate::core::types::{AgentId, ConversationId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationMessage {
    pub sender_id: AgentId,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Progress of a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ConversationStatus {
    /// `turn` is the index of the next turn to be spoken
    Active { turn: usize },
    Completed,
    Aborted { reason: String },
}

impl ConversationStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ConversationStatus::Active { .. })
    }
}

/// A dialogue between exactly two agents. Messages are append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: ConversationId,
    pub participants: [AgentId; 2],
    pub topic: String,
    pub messages: Vec<ConversationMessage>,
    pub status: ConversationStatus,
    pub started_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(initiator: AgentId, partner: AgentId, topic: impl Into<String>) -> Self {
        Self {
            id: ConversationId::generate(),
            participants: [initiator, partner],
            topic: topic.into(),
            messages: Vec::new(),
            status: ConversationStatus::Active { turn: 0 },
            started_at: Utc::now(),
        }
    }

    pub fn is_participant(&self, agent: &AgentId) -> bool {
        self.participants.contains(agent)
    }

    pub fn last_message(&self) -> Option<&ConversationMessage> {
        self.messages.last()
    }

    /// Append a message from one of the participants
    ///
    /// Timestamps never go backwards: a clock step back is clamped to the
    /// previous message's timestamp.
    pub fn push_message(&mut self, sender: &AgentId, content: impl Into<String>) -> Result<()> {
        if !self.is_participant(sender) {
            return Err(NationError::NotAParticipant {
                conversation: self.id.clone(),
                sender: sender.clone(),
            });
        }

        let mut timestamp = Utc::now();
        if let Some(last) = self.messages.last() {
            timestamp = timestamp.max(last.timestamp);
        }

        self.messages.push(ConversationMessage {
            sender_id: sender.clone(),
            content: content.into(),
            timestamp,
        });

        if let ConversationStatus::Active { turn } = &mut self.status {
            *turn += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation() -> Conversation {
        Conversation::new("twin-1".into(), "twin-2".into(), "理想国的构建")
    }

    #[test]
    fn test_new_conversation_is_active_and_empty() {
        let conv = conversation();
        assert!(conv.messages.is_empty());
        assert_eq!(conv.status, ConversationStatus::Active { turn: 0 });
        assert!(!conv.status.is_terminal());
    }

    #[test]
    fn test_push_message_advances_turn_and_orders_timestamps() {
        let mut conv = conversation();
        conv.push_message(&"twin-1".into(), "你好").unwrap();
        conv.push_message(&"twin-2".into(), "你好！").unwrap();

        assert_eq!(conv.status, ConversationStatus::Active { turn: 2 });
        assert!(conv.messages[0].timestamp <= conv.messages[1].timestamp);
        assert_eq!(conv.last_message().unwrap().content, "你好！");
    }

    #[test]
    fn test_outsider_cannot_speak() {
        let mut conv = conversation();
        let err = conv.push_message(&"twin-3".into(), "hi").unwrap_err();
        assert!(matches!(err, NationError::NotAParticipant { .. }));
        assert!(conv.messages.is_empty());
    }

    #[test]
    fn test_status_serializes_with_state_tag() {
        let json = serde_json::to_value(ConversationStatus::Aborted { reason: "timeout".into() }).unwrap();
        assert_eq!(json["state"], "aborted");
        assert_eq!(json["reason"], "timeout");
    }
}
