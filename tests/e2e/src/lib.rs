//! Shared helpers for the Pulse end-to-end tests

use anyhow::{bail, Result};
use entities::{AttributeValue, DefaultEntity};
use tracing_subscriber::EnvFilter;

/// Install a test subscriber once; later calls are no-ops
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_test_writer()
        .try_init();
}

/// Read an integer attribute, failing loudly on absence or a type mismatch
pub fn attr_int(entity: &DefaultEntity, name: &str) -> Result<i64> {
    match entity.attributes().get(name) {
        Some(AttributeValue::Int(value)) => Ok(value),
        Some(other) => bail!("attribute {name} is not an integer: {other}"),
        None => bail!("attribute {name} is not set"),
    }
}
