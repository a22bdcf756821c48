//! In-memory stores for agents, content and conversations

pub mod content;
pub mod conversation_log;
pub mod registry;

pub use content::ContentStore;
pub use conversation_log::ConversationLog;
pub use registry::AgentRegistry;
