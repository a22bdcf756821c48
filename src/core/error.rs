use std::time::Duration;

use thiserror::Error;

use crate::core::types::{AgentId, ConversationId, FragmentId};

#[derive(Error, Debug)]
pub enum NationError {
    #[error("Invalid agent: {0}")]
    InvalidAgent(String),

    #[error("Fragment not found: {0}")]
    FragmentNotFound(FragmentId),

    #[error("{sender} is not a participant of conversation {conversation}")]
    NotAParticipant {
        conversation: ConversationId,
        sender: AgentId,
    },

    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("Gateway timed out after {0:?}")]
    GatewayTimeout(Duration),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
}

impl NationError {
    /// True for failures of the chat gateway (rejection or timeout)
    pub fn is_gateway_failure(&self) -> bool {
        matches!(self, NationError::Gateway(_) | NationError::GatewayTimeout(_))
    }
}

pub type Result<T> = std::result::Result<T, NationError>;
