//! Reveal timing configuration.
//!
//! Shared, immutable-after-init settings cloned into each label at
//! construction. Loadable from JSON for data-driven setups.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Timing and parsing configuration for a typing label.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealConfig {
    /// Default seconds per revealed character.
    pub default_speed_per_char: f32,
    /// Seconds added by a bare `{WAIT}` directive.
    pub default_wait: f32,
    /// Maximum glyphs revealed per `advance` call (0 = unbounded).
    /// Bounds worst-case work after a large delta-time spike.
    pub char_limit_per_tick: u32,
    /// Per-character cooldown multipliers (e.g. longer pauses after `.`).
    /// Characters not present use 1.0.
    pub interval_multipliers: HashMap<char, f32>,
    /// Variables available to every label, consulted after label-local ones.
    pub global_vars: HashMap<String, String>,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            default_speed_per_char: 0.035,
            default_wait: 0.25,
            char_limit_per_tick: 100,
            interval_multipliers: HashMap::new(),
            global_vars: HashMap::new(),
        }
    }
}

impl RevealConfig {
    /// Parse a config from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Cooldown multiplier for a character (1.0 when unregistered).
    pub fn interval_multiplier(&self, ch: char) -> f32 {
        self.interval_multipliers.get(&ch).copied().unwrap_or(1.0)
    }

    /// Register a per-character cooldown multiplier.
    pub fn with_interval_multiplier(mut self, ch: char, multiplier: f32) -> Self {
        self.interval_multipliers.insert(ch, multiplier);
        self
    }

    /// Register a global variable. Names are normalized to uppercase.
    pub fn with_global_var(mut self, name: &str, value: &str) -> Self {
        self.global_vars
            .insert(name.to_uppercase(), value.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = RevealConfig::default();
        assert!((config.default_speed_per_char - 0.035).abs() < 1e-6);
        assert!((config.default_wait - 0.25).abs() < 1e-6);
        assert_eq!(config.char_limit_per_tick, 100);
        assert_eq!(config.interval_multiplier('x'), 1.0);
    }

    #[test]
    fn parse_partial_json() {
        let json = r#"{
            "default_speed_per_char": 0.05,
            "interval_multipliers": { ".": 6.0, ",": 3.0 }
        }"#;
        let config = RevealConfig::from_json(json).unwrap();
        assert!((config.default_speed_per_char - 0.05).abs() < 1e-6);
        assert_eq!(config.interval_multiplier('.'), 6.0);
        assert_eq!(config.interval_multiplier(','), 3.0);
        // Unspecified fields keep their defaults.
        assert_eq!(config.char_limit_per_tick, 100);
    }

    #[test]
    fn parse_rejects_malformed_json() {
        assert!(RevealConfig::from_json("{ not json").is_err());
    }

    #[test]
    fn global_vars_uppercase_names() {
        let config = RevealConfig::default().with_global_var("hero", "Ada");
        assert_eq!(config.global_vars.get("HERO").map(String::as_str), Some("Ada"));
    }
}
