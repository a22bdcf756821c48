pub mod agent;
pub mod conversation;
pub mod fragment;

pub use agent::{Agent, AgentAction};
pub use conversation::{Conversation, ConversationMessage, ConversationStatus};
pub use fragment::{Fragment, FragmentType, Rule};
