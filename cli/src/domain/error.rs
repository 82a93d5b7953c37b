//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use thiserror::Error;

// ── Config errors ─────────────────────────────────────────────────────────────

/// Invalid configuration, detected before anything reaches the engine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unknown setting: {key}\n\nValid settings: {valid}")]
    UnknownKey { key: String, valid: String },

    #[error("Invalid value for {key}: {value}\n\nExpected: {expected}")]
    InvalidValue {
        key: String,
        value: String,
        expected: String,
    },

    #[error("Invalid CIDR block '{0}': expected a.b.c.d/prefix with host bits cleared")]
    InvalidCidr(String),

    #[error("{which} subnet mask /{mask} is outside the allowed range /16../28")]
    MaskOutOfRange { which: &'static str, mask: u8 },

    #[error("{which} subnet mask /{mask} is wider than the network /{network}")]
    MaskWiderThanNetwork {
        which: &'static str,
        mask: u8,
        network: u8,
    },

    #[error("nat_gateways ({gateways}) exceeds az_count ({zones})")]
    TooManyGateways { gateways: u8, zones: u8 },

    #[error("at least one NAT gateway is required for private subnet egress")]
    NoGateways,

    #[error("az_count must be between 1 and {max}, got {got}")]
    ZoneCount { got: u8, max: u8 },

    #[error("network {network} has no room for {subnet} subnets")]
    AddressSpaceExhausted { network: String, subnet: String },

    #[error("subnet ranges {a} and {b} overlap")]
    OverlappingRanges { a: String, b: String },

    #[error(
        "environment variable '{0}' looks like a credential; bind it to a generated secret instead of a literal value"
    )]
    PlaintextSecret(String),

    #[error("env_names.{first} and env_names.{second} both bind '{name}'")]
    DuplicateEnvName {
        name: String,
        first: &'static str,
        second: &'static str,
    },

    #[error("service.environment sets '{name}', which is bound by env_names.{binding}")]
    ReservedEnvName { name: String, binding: &'static str },

    #[error("health check {field} must be positive")]
    HealthCheck { field: &'static str },

    #[error("invalid success code set '{0}': expected codes or ranges like 200-299,301")]
    SuccessCodes(String),
}

// ── Composition errors ────────────────────────────────────────────────────────

/// A composer was handed an upstream descriptor it cannot build on.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompositionError {
    #[error("database '{0}' has no endpoint; compose it with compose_database first")]
    MissingEndpoint(String),

    #[error("file share '{0}' has no share id")]
    MissingShareId(String),

    #[error("load balancer '{0}' has no DNS name handle")]
    MissingDnsName(String),

    #[error("{0} belongs to a different network than the application")]
    ForeignNetwork(&'static str),

    #[error("image asset '{0}' has no content digest; resolve the asset before composing")]
    UnresolvedImage(String),

    #[error("template assembly failed: {0}")]
    Template(#[from] stackweave_common::TemplateError),
}

// ── Engine errors ─────────────────────────────────────────────────────────────

/// Failures reported by the external provisioning engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{command} failed for stack {stack} (exit {code}):\n{stderr}")]
    CommandFailed {
        command: String,
        stack: String,
        code: i32,
        stderr: String,
    },

    #[error("stack {0} does not exist")]
    StackNotFound(String),

    #[error("unexpected engine output for {stack}: {reason}")]
    MalformedOutput { stack: String, reason: String },
}

impl EngineError {
    /// Short machine-readable code used by `--json` error output.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::CommandFailed { .. } => "ENGINE_COMMAND_FAILED",
            EngineError::StackNotFound(_) => "STACK_NOT_FOUND",
            EngineError::MalformedOutput { .. } => "ENGINE_OUTPUT",
        }
    }
}
