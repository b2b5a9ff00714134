//! # Pulse Centralized Configuration
//!
//! This crate provides centralized configuration management and constants
//! for the Pulse kernel crates, eliminating duplication across the codebase.
//!
//! ## Features
//!
//! - **Engine Defaults**: shutdown drain bounds, task registry tuning
//! - **Engine Settings**: tunable values loaded from TOML files with
//!   environment-specific overrides
//!
//! ## Usage
//!
//! ```rust
//! use config::{defaults, EngineSettings};
//!
//! // Use engine constants
//! let drain = defaults::engine::DRAIN_TIMEOUT_MS;
//!
//! // Load tunables (falls back to defaults when no file is present)
//! let settings = EngineSettings::load(None, None).unwrap();
//! assert_eq!(settings.drain_timeout_ms, drain);
//! ```

pub mod defaults;
pub mod settings;

// Re-export commonly used types
pub use settings::{ConfigError, EngineSettings};
