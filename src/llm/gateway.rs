//! Chat gateway - the narrow contract the simulation needs from an LLM
//!
//! The scheduler only ever asks for one completion given a role-tagged
//! history. How that completion is produced (HTTP backend, canned stub)
//! lives behind [`ChatGateway`].

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::config::SamplingParams;
use crate::core::error::{NationError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: ChatRole::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: ChatRole::Assistant, content: content.into() }
    }
}

/// One completion request
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>, sampling: SamplingParams) -> Self {
        Self {
            messages,
            temperature: sampling.temperature,
            max_tokens: sampling.max_tokens,
        }
    }

    /// The system prompt, if the history starts with one
    pub fn system_prompt(&self) -> Option<&str> {
        self.messages
            .first()
            .filter(|m| m.role == ChatRole::System)
            .map(|m| m.content.as_str())
    }
}

/// Produces one generated utterance from a message history
#[async_trait]
pub trait ChatGateway: Send + Sync {
    async fn chat(&self, request: ChatRequest) -> Result<String>;
}

/// Gateway that always answers with the same text
///
/// Used for offline runs and tests.
#[derive(Debug)]
pub struct CannedGateway {
    reply: String,
    calls: AtomicUsize,
}

impl CannedGateway {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of requests served so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatGateway for CannedGateway {
    async fn chat(&self, _request: ChatRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }
}

/// Wraps a gateway so that no call outlives `timeout`
///
/// Expiry is reported as [`NationError::GatewayTimeout`], which callers
/// treat like any other gateway failure.
#[derive(Clone)]
pub struct TimeoutGateway {
    inner: Arc<dyn ChatGateway>,
    timeout: Duration,
}

impl TimeoutGateway {
    pub fn new(inner: Arc<dyn ChatGateway>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl ChatGateway for TimeoutGateway {
    async fn chat(&self, request: ChatRequest) -> Result<String> {
        match tokio::time::timeout(self.timeout, self.inner.chat(request)).await {
            Ok(result) => result,
            Err(_) => Err(NationError::GatewayTimeout(self.timeout)),
        }
    }
}
