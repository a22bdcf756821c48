//! Behavior simulation: policy, behaviors, conversations and the tick loop

pub mod actions;
pub mod conversation;
pub mod movement;
pub mod nation;
pub mod policy;
pub mod population;
pub mod scheduler;
pub mod synthesis;

pub use conversation::{ConversationRun, RunState};
pub use nation::Nation;
pub use policy::{choose_behavior, Behavior};
pub use population::default_population;
pub use scheduler::TickReport;
