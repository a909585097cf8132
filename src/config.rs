//! Service and engine configuration.
//!
//! Loaded from a TOML file; every field has a default, so an empty file
//! (or no file at all) yields the production settings:
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1:8080"
//!
//! [engine]
//! max_attempts = 50
//! fallback_attempts = 10
//! redistribution_limit = 5
//! parallel = true
//! # seed = 42
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
        }
    }
}

/// Search limits of the optimizer and the fallback assigner.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound on optimizer attempts per run.
    pub max_attempts: u32,
    /// Attempts of the fallback assigner. Zero disables the fallback.
    pub fallback_attempts: u32,
    /// Stranded slots the fallback tries to redistribute after its main pass.
    pub redistribution_limit: usize,
    /// Run optimizer attempts on the rayon thread pool.
    pub parallel: bool,
    /// Default seed when a request carries none.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_attempts: 50,
            fallback_attempts: 10,
            redistribution_limit: 5,
            parallel: true,
            seed: None,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "engine.max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl AppConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(s)?;
        config.engine.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:8080");
        assert_eq!(config.engine.max_attempts, 50);
        assert_eq!(config.engine.fallback_attempts, 10);
        assert!(config.engine.parallel);
        assert_eq!(config.engine.seed, None);
    }

    #[test]
    fn test_partial_engine_section() {
        let config = AppConfig::from_toml_str(
            r#"
            [engine]
            max_attempts = 8
            parallel = false
            seed = 7
            "#,
        )
        .unwrap();
        assert_eq!(config.engine.max_attempts, 8);
        assert!(!config.engine.parallel);
        assert_eq!(config.engine.seed, Some(7));
        assert_eq!(config.engine.redistribution_limit, 5);
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let err = AppConfig::from_toml_str("[engine]\nmax_attempts = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = AppConfig::load("/nonexistent/shift_solver.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
