//! Simulation configuration with documented constants
//!
//! All tunables of the behavior loop are collected here with explanations of
//! their purpose and how they interact with each other.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::error::{NationError, Result};

/// Sampling parameters for one kind of gateway call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl SamplingParams {
    pub const fn new(temperature: f32, max_tokens: u32) -> Self {
        Self { temperature, max_tokens }
    }
}

/// Sampling parameters per call site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// One conversation turn. Warm and short.
    pub conversation: SamplingParams,
    /// Fragment creation. Most creative.
    pub fragment: SamplingParams,
    /// Rule synthesis from a fragment window
    pub rule: SamplingParams,
    /// Fragment analysis. Cold, since the reply must be JSON.
    pub analysis: SamplingParams,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            conversation: SamplingParams::new(0.8, 200),
            fragment: SamplingParams::new(0.9, 300),
            rule: SamplingParams::new(0.7, 500),
            analysis: SamplingParams::new(0.3, 300),
        }
    }
}

/// Configuration for the behavior simulation
///
/// Every field has a default, so a TOML file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    // === SPATIAL ===
    /// Horizontal distance under which two agents may converse (world units)
    pub proximity_radius: f32,

    /// Horizontal distance an observing agent looks around (world units)
    ///
    /// Wider than `proximity_radius`: observing is how agents notice
    /// others that are not close enough to talk to yet.
    pub observe_radius: f32,

    // === POLICY ===
    /// A roll above this converses (if anyone is nearby)
    ///
    /// The roll is uniform in [0, 1). The thresholds partition it:
    /// `(converse, 1)` converse, `(wander, converse]` wander,
    /// `(think, wander]` think, `(observe, think]` observe,
    /// `[0, observe]` create a fragment.
    pub converse_threshold: f64,
    pub wander_threshold: f64,
    pub think_threshold: f64,
    pub observe_threshold: f64,

    /// Chance that thinking ends in a fragment
    pub think_create_probability: f64,

    /// Chance that observing escalates into a conversation
    pub observe_converse_probability: f64,

    /// Chance per tick that one random agent is made to create a fragment
    ///
    /// Small populations rarely roll a creation on their own; this keeps
    /// the content store growing so rule synthesis has material.
    pub injection_probability: f64,

    // === MOVEMENT ===
    /// Minimum horizontal displacement of one wander step
    pub wander_min_distance: f32,
    /// Maximum horizontal displacement of one wander step
    pub wander_max_distance: f32,

    // === TIMING (milliseconds) ===
    /// Pause between the end of one tick and the start of the next
    pub tick_interval_ms: u64,
    /// How long a thinking agent dwells before deciding
    pub think_dwell_ms: u64,
    /// How long an observing agent dwells before deciding
    pub observe_dwell_ms: u64,
    /// Pause between conversation turns
    pub turn_delay_ms: u64,
    /// Upper bound on a single gateway call; expiry counts as a failure
    pub gateway_timeout_ms: u64,

    // === CONTENT ===
    /// Turns per conversation, alternating speakers
    pub conversation_turns: usize,
    /// Fragments required before rule synthesis fires
    pub rule_min_fragments: usize,
    /// Most recent fragments shown to the synthesizer
    pub rule_window: usize,
    /// Most recent fragments of the window credited as rule sources
    pub rule_sources: usize,
    /// Memories kept per agent; oldest are evicted first
    pub max_memories: usize,
    /// Ask the gateway to score and tag each new fragment
    pub analyze_fragments: bool,

    // === PLUMBING ===
    /// Buffered events per subscriber before it starts lagging
    pub event_capacity: usize,
    /// Fixed RNG seed for reproducible runs
    pub seed: Option<u64>,

    pub sampling: SamplingConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            proximity_radius: 10.0,
            observe_radius: 15.0,

            converse_threshold: 0.6,
            wander_threshold: 0.4,
            think_threshold: 0.2,
            observe_threshold: 0.1,
            think_create_probability: 0.5,
            observe_converse_probability: 0.3,
            injection_probability: 0.6,

            wander_min_distance: 2.0,
            wander_max_distance: 5.0,

            tick_interval_ms: 5_000,
            think_dwell_ms: 2_000,
            observe_dwell_ms: 2_000,
            turn_delay_ms: 2_000,
            gateway_timeout_ms: 30_000,

            conversation_turns: 3,
            rule_min_fragments: 5,
            rule_window: 10,
            rule_sources: 5,
            max_memories: 20,
            analyze_fragments: false,

            event_capacity: 256,
            seed: None,

            sampling: SamplingConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Load a (possibly partial) TOML file over the defaults and validate it
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(content)?;
        config.validate().map_err(NationError::Config)?;
        Ok(config)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn think_dwell(&self) -> Duration {
        Duration::from_millis(self.think_dwell_ms)
    }

    pub fn observe_dwell(&self) -> Duration {
        Duration::from_millis(self.observe_dwell_ms)
    }

    pub fn turn_delay(&self) -> Duration {
        Duration::from_millis(self.turn_delay_ms)
    }

    pub fn gateway_timeout(&self) -> Duration {
        Duration::from_millis(self.gateway_timeout_ms)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> std::result::Result<(), String> {
        // NaN slips through every ordered comparison below
        let floats = [
            ("proximity_radius", self.proximity_radius as f64),
            ("observe_radius", self.observe_radius as f64),
            ("converse_threshold", self.converse_threshold),
            ("wander_threshold", self.wander_threshold),
            ("think_threshold", self.think_threshold),
            ("observe_threshold", self.observe_threshold),
            ("think_create_probability", self.think_create_probability),
            ("observe_converse_probability", self.observe_converse_probability),
            ("injection_probability", self.injection_probability),
            ("wander_min_distance", self.wander_min_distance as f64),
            ("wander_max_distance", self.wander_max_distance as f64),
        ];
        if let Some((name, value)) = floats.iter().find(|(_, v)| !v.is_finite()) {
            return Err(format!("{} ({}) must be finite", name, value));
        }

        if self.proximity_radius <= 0.0 || self.observe_radius <= 0.0 {
            return Err("Radii must be positive".into());
        }

        // Thresholds must carve [0, 1) into ordered bands
        let bands = [
            self.converse_threshold,
            self.wander_threshold,
            self.think_threshold,
            self.observe_threshold,
        ];
        if bands.iter().any(|t| !(0.0..=1.0).contains(t)) {
            return Err("Policy thresholds must lie in [0, 1]".into());
        }
        if bands.windows(2).any(|w| w[0] < w[1]) {
            return Err(format!(
                "Policy thresholds must be descending (converse {} >= wander {} >= think {} >= observe {})",
                self.converse_threshold,
                self.wander_threshold,
                self.think_threshold,
                self.observe_threshold
            ));
        }

        let probabilities = [
            ("think_create_probability", self.think_create_probability),
            ("observe_converse_probability", self.observe_converse_probability),
            ("injection_probability", self.injection_probability),
        ];
        for (name, p) in probabilities {
            if !(0.0..=1.0).contains(&p) {
                return Err(format!("{} ({}) must lie in [0, 1]", name, p));
            }
        }

        if self.wander_min_distance < 0.0 || self.wander_min_distance > self.wander_max_distance {
            return Err(format!(
                "wander_min_distance ({}) must be >= 0 and <= wander_max_distance ({})",
                self.wander_min_distance, self.wander_max_distance
            ));
        }

        if self.conversation_turns == 0 {
            return Err("conversation_turns must be at least 1".into());
        }

        if self.rule_min_fragments == 0 || self.rule_sources == 0 {
            return Err("rule_min_fragments and rule_sources must be at least 1".into());
        }
        if self.rule_sources > self.rule_window {
            return Err(format!(
                "rule_sources ({}) cannot exceed rule_window ({})",
                self.rule_sources, self.rule_window
            ));
        }

        if self.gateway_timeout_ms == 0 {
            return Err("gateway_timeout_ms must be positive".into());
        }

        if self.event_capacity == 0 {
            return Err("event_capacity must be positive".into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_matches_reference_behavior() {
        let config = SimulationConfig::default();
        assert_eq!(config.proximity_radius, 10.0);
        assert_eq!(config.observe_radius, 15.0);
        assert_eq!(config.conversation_turns, 3);
        assert_eq!(config.rule_min_fragments, 5);
        assert_eq!(config.rule_window, 10);
        assert_eq!(config.rule_sources, 5);
        assert_eq!(config.tick_interval(), Duration::from_secs(5));
        assert_eq!(config.turn_delay(), Duration::from_secs(2));
    }

    #[test]
    fn test_rejects_unordered_thresholds() {
        let config = SimulationConfig {
            wander_threshold: 0.7,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_sources_larger_than_window() {
        let config = SimulationConfig {
            rule_sources: 12,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_inverted_wander_bounds() {
        let config = SimulationConfig {
            wander_min_distance: 6.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_non_finite_values() {
        for toml in [
            "wander_max_distance = inf",
            "proximity_radius = nan",
            "observe_radius = inf",
            "injection_probability = nan",
            "think_threshold = -inf",
        ] {
            let err = SimulationConfig::from_toml_str(toml).unwrap_err();
            assert!(matches!(err, NationError::Config(_)), "{} accepted", toml);
        }
    }

    #[test]
    fn test_partial_toml_overrides_defaults() {
        let config = SimulationConfig::from_toml_str(
            r#"
            proximity_radius = 12.5
            seed = 7

            [sampling.conversation]
            temperature = 0.5
            max_tokens = 120
            "#,
        )
        .unwrap();

        assert_eq!(config.proximity_radius, 12.5);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.sampling.conversation.max_tokens, 120);
        // Untouched keys keep their defaults
        assert_eq!(config.observe_radius, 15.0);
        assert_eq!(config.sampling.fragment, SamplingParams::new(0.9, 300));
    }

    #[test]
    fn test_invalid_toml_values_are_config_errors() {
        let err = SimulationConfig::from_toml_str("injection_probability = 1.5").unwrap_err();
        assert!(matches!(err, NationError::Config(_)));
    }
}
