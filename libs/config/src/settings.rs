//! Engine settings
//!
//! Provides configuration loading for the action engine. Supports loading
//! from TOML files with environment-specific overrides and `PULSE_`-prefixed
//! environment variables; falls back to the constants in [`crate::defaults`]
//! when no configuration source is present.

use crate::defaults;
use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration load failed: {0}")]
    Load(#[from] config_crate::ConfigError),
}

/// Result type alias for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Tunable values for the pool-backed action engine
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct EngineSettings {
    /// Engine name used in log fields
    pub name: String,

    /// Upper bound on graceful shutdown drain (milliseconds)
    pub drain_timeout_ms: u64,

    /// Finished task handles are reaped once the registry grows past this
    pub task_reap_threshold: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            name: defaults::engine::NAME.to_string(),
            drain_timeout_ms: defaults::engine::DRAIN_TIMEOUT_MS,
            task_reap_threshold: defaults::engine::TASK_REAP_THRESHOLD,
        }
    }
}

impl EngineSettings {
    /// Load settings from files with environment overrides
    ///
    /// All sources are optional; a missing base file yields the defaults.
    pub fn load(base_path: Option<&Path>, environment: Option<&str>) -> Result<Self> {
        let base = base_path.unwrap_or(Path::new("config/engine.toml"));

        let mut builder = Config::builder().add_source(File::from(base).required(false));

        // Add environment-specific overrides if specified
        if let Some(env) = environment {
            let env_file = PathBuf::from("config/environments").join(format!("{}.toml", env));

            if env_file.exists() {
                info!("Loading environment config: {:?}", env_file);
                builder = builder.add_source(File::from(env_file));
            } else {
                warn!("Environment config not found: {:?}", env_file);
            }
        }

        // Override with environment variables (PULSE_ prefix)
        builder = builder.add_source(
            Environment::with_prefix("PULSE")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Shutdown drain bound as a [`std::time::Duration`]
    pub fn drain_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.drain_timeout_ms)
    }
}
