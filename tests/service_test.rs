//! Service construction and server metadata

mod common;

use common::{service, InMemoryVault};
use std::collections::HashMap;
use vault_versioned_sdk::{Auth, ClientBuilder, Error, ErrorKind, KeyValueBackend};

#[tokio::test]
async fn test_server_version() {
    let (vault, _) = service();

    assert_eq!(vault.server_version().await.unwrap(), "1.15.2");
    let health = vault.health().await.unwrap();
    assert!(health.initialized);
    assert!(!health.sealed);
}

#[test]
fn test_kv1_backend_fails_at_construction() {
    let store = InMemoryVault::new();
    let result = ClientBuilder::new("https://vault.test:8200")
        .auth(Auth::token("root"))
        .kv_backend(KeyValueBackend::V1)
        .build_with_transport(store.clone());

    match result {
        Err(Error::UnsupportedBackend(message)) => {
            assert_eq!(message, "Must be a kv2 backend to support versioned secrets");
        }
        other => panic!("Expected UnsupportedBackend, got {:?}", other),
    }
    assert_eq!(store.requests(), 0);
}

#[test]
fn test_kv1_backend_from_properties() {
    let properties: HashMap<String, String> = [
        ("vault.uri", "https://vault.test:8200"),
        ("vault.token", "root"),
        ("vault.kv.version", "1"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    let err = ClientBuilder::from_properties(&properties)
        .unwrap()
        .build()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedBackendConfiguration);
}

#[test]
fn test_missing_auth_is_config_error() {
    let err = ClientBuilder::new("https://vault.test:8200")
        .build_with_transport(InMemoryVault::new())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
}

#[tokio::test]
async fn test_custom_transit_mount() {
    let store = InMemoryVault::new();
    let vault = ClientBuilder::new("https://vault.test:8200")
        .auth(Auth::token("root"))
        .transit_mount("/crypto/")
        .build_with_transport(store.clone())
        .unwrap();

    assert_eq!(vault.config().transit_mount, "crypto");
    // The in-memory engine only serves transit/, so the custom mount is routed elsewhere
    let err = vault.encrypt("orders", b"data").await.unwrap_err();
    assert_eq!(err.status_code(), Some(404));
}

#[tokio::test]
async fn test_service_clones_share_state() {
    let (vault, store) = service();
    let clone = vault.clone();

    let _ = vault.write_secret("kv", "shared", "value").await.unwrap();
    assert_eq!(
        clone.read_secret("kv", "shared").await.unwrap().as_deref(),
        Some("value")
    );
    assert_eq!(store.writes(), 1);
    assert_eq!(clone.handle_stats().created(), 1);
}
