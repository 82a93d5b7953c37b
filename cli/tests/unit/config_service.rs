//! Unit tests for configuration use-cases.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use stackweave_cli::application::services::config_service::{load_effective, set_value};

use crate::mocks::MemoryConfigStore;

#[test]
fn test_set_value_persists_valid_setting() {
    let store = MemoryConfigStore::default();

    let config = set_value(&store, "engine.region", "eu-west-1").expect("set");

    assert_eq!(config.engine.region.as_deref(), Some("eu-west-1"));
    assert_eq!(*store.saves.lock().unwrap(), 1);
}

#[test]
fn test_set_value_rejects_without_saving() {
    let store = MemoryConfigStore::default();

    assert!(set_value(&store, "network.nat_gateways", "3").is_err());
    assert!(set_value(&store, "database.password", "hunter2").is_err());
    assert_eq!(*store.saves.lock().unwrap(), 0);
}

#[test]
fn test_load_effective_applies_environment_override() {
    let store = MemoryConfigStore::default();

    let config = load_effective(&store, Some("PROD")).expect("load");

    assert_eq!(config.application.environment, "PROD");
    assert_eq!(*store.saves.lock().unwrap(), 0, "override is never persisted");
}

#[test]
fn test_load_effective_rejects_unusable_environment() {
    let store = MemoryConfigStore::default();
    let err = load_effective(&store, Some("prod-eu")).unwrap_err();
    assert!(err.to_string().contains("prod-eu"));
}
