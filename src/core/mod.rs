pub mod config;
pub mod error;
pub mod types;

pub use config::{SamplingConfig, SamplingParams, SimulationConfig};
pub use error::{NationError, Result};
