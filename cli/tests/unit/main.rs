//! Unit tests for stackweave CLI
//!
//! These tests use mocked ports and run fast without external I/O.

mod architecture;
mod cloudformation_engine;
mod config_service;
mod deploy_service;
mod destroy_service;
mod mocks;
mod synth_service;
