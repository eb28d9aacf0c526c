use std::path::Path;

use crate::error::RecognitionError;

/// Shared search configuration for every selection strategy.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct SelectorConfig {
    /// Smallest candidate hidden-state count (inclusive).
    #[serde(default = "default_min_states")]
    pub min_states: usize,
    /// Largest candidate hidden-state count (inclusive).
    #[serde(default = "default_max_states")]
    pub max_states: usize,
    /// State count used by the constant strategy and as the fallback fit.
    #[serde(default = "default_constant_states")]
    pub constant_states: usize,
    /// Seed handed to every trainer call so selection is reproducible.
    #[serde(default = "default_random_seed")]
    pub random_seed: u64,
}

impl SelectorConfig {
    pub const DEFAULT_MIN_STATES: usize = 2;
    pub const DEFAULT_MAX_STATES: usize = 10;
    pub const DEFAULT_CONSTANT_STATES: usize = 3;
    pub const DEFAULT_RANDOM_SEED: u64 = 14;

    pub fn load(path: &Path) -> Result<Self, RecognitionError> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| RecognitionError::io("read selector config", e))?;
        let config: Self = serde_json::from_str(&data)
            .map_err(|e| RecognitionError::json("parse selector config", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RecognitionError> {
        if self.min_states == 0 || self.constant_states == 0 {
            return Err(RecognitionError::invalid_input(
                "state counts must be at least 1",
            ));
        }
        if self.min_states > self.max_states {
            return Err(RecognitionError::invalid_input(format!(
                "min_states {} exceeds max_states {}",
                self.min_states, self.max_states
            )));
        }
        Ok(())
    }
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            min_states: Self::DEFAULT_MIN_STATES,
            max_states: Self::DEFAULT_MAX_STATES,
            constant_states: Self::DEFAULT_CONSTANT_STATES,
            random_seed: Self::DEFAULT_RANDOM_SEED,
        }
    }
}

fn default_min_states() -> usize {
    SelectorConfig::DEFAULT_MIN_STATES
}
fn default_max_states() -> usize {
    SelectorConfig::DEFAULT_MAX_STATES
}
fn default_constant_states() -> usize {
    SelectorConfig::DEFAULT_CONSTANT_STATES
}
fn default_random_seed() -> u64 {
    SelectorConfig::DEFAULT_RANDOM_SEED
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_config_default() {
        let config = SelectorConfig::default();
        assert_eq!(config.min_states, 2);
        assert_eq!(config.max_states, 10);
        assert_eq!(config.constant_states, 3);
        assert_eq!(config.random_seed, 14);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let json = r#"{ "max_states": 6 }"#;
        let config: SelectorConfig = serde_json::from_str(json).expect("valid config json");
        assert_eq!(config.max_states, 6);
        assert_eq!(config.min_states, SelectorConfig::DEFAULT_MIN_STATES);
        assert_eq!(config.random_seed, SelectorConfig::DEFAULT_RANDOM_SEED);
    }

    #[test]
    fn validate_rejects_inverted_range() {
        let config = SelectorConfig {
            min_states: 8,
            max_states: 4,
            ..SelectorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_reads_json_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("selector.json");
        std::fs::write(
            &path,
            r#"{ "min_states": 3, "max_states": 5, "random_seed": 7 }"#,
        )
        .expect("write config");
        let config = SelectorConfig::load(&path).expect("load config");
        assert_eq!(config.min_states, 3);
        assert_eq!(config.max_states, 5);
        assert_eq!(config.random_seed, 7);
        assert_eq!(
            config.constant_states,
            SelectorConfig::DEFAULT_CONSTANT_STATES
        );
    }
}
