//! Domain layer: pure descriptor types, composers, validation and synthesis.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod access;
pub mod application;
pub mod balancer;
pub mod config;
pub mod database;
pub mod error;
pub mod graph;
pub mod handle;
pub mod network;
pub mod storage;
pub mod synth;

pub use config::{StackConfig, validate_config_key, validate_config_value};
pub use error::{CompositionError, ConfigError, EngineError};
pub use graph::{CompositionContext, DeploymentGraph, Plan, compose};
pub use synth::{StackTemplate, Synthesis, synthesize};
