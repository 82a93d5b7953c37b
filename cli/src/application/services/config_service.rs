//! Application service: configuration use-cases.

use anyhow::Result;

use crate::application::ports::ConfigStore;
use crate::domain::config::{StackConfig, set_config_value, validate_name};

/// Load configuration.
pub fn load_config(store: &impl ConfigStore) -> Result<StackConfig> {
    store.load()
}

/// Validate and apply one whitelisted setting, then persist it.
///
/// # Errors
///
/// Returns an error if the key or value is invalid or the file cannot be
/// written. Nothing is saved on validation failure.
pub fn set_value(store: &impl ConfigStore, key: &str, value: &str) -> Result<StackConfig> {
    let mut config = store.load()?;
    set_config_value(&mut config, key, value)?;
    store.save(&config)?;
    Ok(config)
}

/// Load configuration and apply the per-invocation environment override.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the override is not a
/// usable environment tag.
pub fn load_effective(store: &impl ConfigStore, environment: Option<&str>) -> Result<StackConfig> {
    let mut config = store.load()?;
    if let Some(env) = environment {
        validate_name("environment", env)?;
        tracing::debug!(environment = env, "environment override");
        config.application.environment = env.to_string();
    }
    Ok(config)
}
