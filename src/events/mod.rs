//! Outbound notifications of simulation state changes

pub mod bus;

pub use bus::{EventBus, EventKind, EventSubscription, NationEvent};
