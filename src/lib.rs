//! Ideal Nation - autonomous digital twin behavior engine

pub mod core;
pub mod entity;
pub mod events;
pub mod llm;
pub mod simulation;
pub mod spatial;
pub mod world;
