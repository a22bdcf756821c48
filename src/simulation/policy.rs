//! Behavior policy - map one uniform roll onto a single decision

use serde::Serialize;

use crate::core::config::SimulationConfig;

/// The one thing an agent does this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Behavior {
    Converse,
    Wander,
    Think,
    Observe,
    CreateFragment,
}

impl Behavior {
    pub fn as_str(&self) -> &'static str {
        match self {
            Behavior::Converse => "converse",
            Behavior::Wander => "wander",
            Behavior::Think => "think",
            Behavior::Observe => "observe",
            Behavior::CreateFragment => "create_fragment",
        }
    }
}

/// Choose a behavior from `roll` in [0, 1)
///
/// A converse roll with nobody nearby wanders instead.
pub fn choose_behavior(roll: f64, has_nearby: bool, config: &SimulationConfig) -> Behavior {
    if roll > config.converse_threshold {
        if has_nearby {
            Behavior::Converse
        } else {
            Behavior::Wander
        }
    } else if roll > config.wander_threshold {
        Behavior::Wander
    } else if roll > config.think_threshold {
        Behavior::Think
    } else if roll > config.observe_threshold {
        Behavior::Observe
    } else {
        Behavior::CreateFragment
    }
}
