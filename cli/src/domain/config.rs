//! Domain types and validators for stackweave configuration.
//!
//! Pure functions only: no I/O and no async.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::application::ServiceParams;
use crate::domain::database::DatabaseParams;
use crate::domain::error::ConfigError;
use crate::domain::network::{MAX_ZONES, NetworkParams};
use crate::domain::storage::StorageParams;

// ── Constants ────────────────────────────────────────────────────────────────

pub const VALID_CONFIG_KEYS: &[&str] = &[
    "application.name",
    "application.environment",
    "engine.region",
    "engine.profile",
    "network.az_count",
    "network.nat_gateways",
];

/// Application names and environment tags become part of stack names and
/// logical ids, so they are restricted to letters and digits.
pub static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[A-Za-z][A-Za-z0-9]{0,15}$").expect("valid regex")
});

static REGION_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[a-z]{2}(-[a-z]+)+-\d$").expect("valid regex")
});

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration stored in `~/.stackweave/config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StackConfig {
    pub application: ApplicationConfig,
    pub engine: EngineConfig,
    pub network: NetworkParams,
    pub database: DatabaseParams,
    pub storage: StorageParams,
    pub service: ServiceParams,
}

/// Deployment identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Prefix of every stack name, e.g. `Moodle`.
    pub name: String,
    /// Environment tag, e.g. `DEV`. Suffix of every stack name.
    pub environment: String,
    /// Extra tags applied to every stack.
    pub tags: BTreeMap<String, String>,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: "Moodle".to_string(),
            environment: "DEV".to_string(),
            tags: BTreeMap::new(),
        }
    }
}

/// Provisioning engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    /// Directory synthesized templates are written to.
    pub out_dir: PathBuf,
    /// Upper bound for a single engine command, in seconds.
    pub command_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            region: None,
            profile: None,
            out_dir: PathBuf::from("stackweave.out"),
            command_timeout_secs: 1800,
        }
    }
}

// ── Validators ───────────────────────────────────────────────────────────────

/// Validates a configuration key against the whitelist.
///
/// # Errors
///
/// Returns an error if the key is not in the allowed list.
pub fn validate_config_key(key: &str) -> Result<()> {
    if !VALID_CONFIG_KEYS.contains(&key) {
        return Err(ConfigError::UnknownKey {
            key: key.to_string(),
            valid: VALID_CONFIG_KEYS.join(", "),
        }
        .into());
    }
    Ok(())
}

/// Validates a configuration value for the given key.
///
/// # Errors
///
/// Returns an error if the value is not valid for the key.
pub fn validate_config_value(key: &str, value: &str) -> Result<()> {
    let invalid = |expected: &str| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        expected: expected.to_string(),
    };
    match key {
        "application.name" | "application.environment" => {
            validate_name(key, value)?;
        }
        "engine.region" => {
            if !REGION_RE.is_match(value) {
                return Err(invalid("a region name such as eu-west-1").into());
            }
        }
        "engine.profile" => {
            if value.is_empty() || value.chars().any(char::is_whitespace) {
                return Err(invalid("a profile name without whitespace").into());
            }
        }
        "network.az_count" | "network.nat_gateways" => {
            let n: u8 = value
                .parse()
                .map_err(|_| invalid(&format!("an integer between 1 and {MAX_ZONES}")))?;
            if !(1..=MAX_ZONES).contains(&n) {
                return Err(invalid(&format!("an integer between 1 and {MAX_ZONES}")).into());
            }
        }
        _ => {}
    }
    Ok(())
}

/// Validates an application name or environment tag.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] unless the value is 1-16 letters or
/// digits starting with a letter.
pub fn validate_name(key: &str, value: &str) -> Result<(), ConfigError> {
    if NAME_RE.is_match(value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            expected: "1-16 letters or digits, starting with a letter".to_string(),
        })
    }
}

/// Validates `key` and `value`, then applies the value to `config`.
///
/// # Errors
///
/// Returns an error if the key is unknown or the value is invalid. The
/// resulting network parameters must also still hold together, so raising
/// `network.nat_gateways` above `network.az_count` is rejected here.
pub fn set_config_value(config: &mut StackConfig, key: &str, value: &str) -> Result<()> {
    validate_config_key(key)?;
    validate_config_value(key, value)?;
    let mut next = config.clone();
    match key {
        "application.name" => next.application.name = value.to_string(),
        "application.environment" => next.application.environment = value.to_string(),
        "engine.region" => next.engine.region = Some(value.to_string()),
        "engine.profile" => next.engine.profile = Some(value.to_string()),
        "network.az_count" => next.network.az_count = value.parse()?,
        "network.nat_gateways" => next.network.nat_gateways = value.parse()?,
        _ => {}
    }
    if next.network.nat_gateways > next.network.az_count {
        return Err(ConfigError::TooManyGateways {
            gateways: next.network.nat_gateways,
            zones: next.network.az_count,
        }
        .into());
    }
    *config = next;
    Ok(())
}

/// Reads a whitelisted key back as a display string.
#[must_use]
pub fn get_config_value(config: &StackConfig, key: &str) -> Option<String> {
    match key {
        "application.name" => Some(config.application.name.clone()),
        "application.environment" => Some(config.application.environment.clone()),
        "engine.region" => config.engine.region.clone(),
        "engine.profile" => config.engine.profile.clone(),
        "network.az_count" => Some(config.network.az_count.to_string()),
        "network.nat_gateways" => Some(config.network.nat_gateways.to_string()),
        _ => None,
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
