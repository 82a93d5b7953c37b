//! Integration tests for the stackweave CLI
//!
//! These tests spawn the actual binary and never reach a provisioning
//! engine: only commands that compose and write locally are exercised.

mod cli_tests;
mod config_command;
mod synth_command;
