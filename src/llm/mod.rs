//! LLM integration: the chat gateway contract, an HTTP client and prompts

pub mod analysis;
pub mod client;
pub mod gateway;
pub mod prompts;

pub use client::LlmClient;
pub use gateway::{CannedGateway, ChatGateway, ChatMessage, ChatRequest, ChatRole, TimeoutGateway};
