//! In-memory Vault for integration tests
//!
//! Emulates just enough of a KV v2 engine (versioned writes, reads by
//! version, deleted versions, root listing) and a transit engine to drive the
//! service end to end without a server.

#![allow(dead_code)]

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use vault_versioned_sdk::{
    Auth, ClientBuilder, Operation, Result, Transport, VaultRequest, VaultResponse, VaultService,
};

const CIPHERTEXT_PREFIX: &str = "vault:v1:";
const CREATED_TIME: &str = "2024-01-01T00:00:00Z";

#[derive(Debug)]
struct StoredVersion {
    data: Value,
    deleted: bool,
}

/// KV v2 and transit engines kept in process memory
#[derive(Debug, Default)]
pub struct InMemoryVault {
    secrets: Mutex<BTreeMap<(String, String), Vec<StoredVersion>>>,
    writes: AtomicUsize,
    requests: AtomicUsize,
}

impl InMemoryVault {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Number of KV writes that reached the engine
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of requests of any kind
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Soft-delete a stored version, as `vault kv delete -versions=N` would
    pub fn delete_version(&self, mount: &str, key: &str, version: usize) {
        let mut secrets = self.secrets.lock().unwrap();
        if let Some(stored) = secrets
            .get_mut(&(mount.to_string(), key.to_string()))
            .and_then(|versions| versions.get_mut(version - 1))
        {
            stored.deleted = true;
        }
    }

    /// Store a raw payload, bypassing the client
    pub fn seed(&self, mount: &str, key: &str, data: Value) {
        let mut secrets = self.secrets.lock().unwrap();
        secrets
            .entry((mount.to_string(), key.to_string()))
            .or_default()
            .push(StoredVersion {
                data,
                deleted: false,
            });
    }

    fn write(&self, mount: &str, key: &str, body: Option<Value>) -> VaultResponse {
        let Some(data) = body.and_then(|mut body| body.get_mut("data").map(Value::take)) else {
            return error(400, "no data provided");
        };
        let _ = self.writes.fetch_add(1, Ordering::SeqCst);

        let mut secrets = self.secrets.lock().unwrap();
        let versions = secrets
            .entry((mount.to_string(), key.to_string()))
            .or_default();
        versions.push(StoredVersion {
            data,
            deleted: false,
        });
        ok(json!({ "data": metadata(versions.len(), false) }))
    }

    fn read(&self, mount: &str, key: &str, query: &[(String, String)]) -> VaultResponse {
        let secrets = self.secrets.lock().unwrap();
        let Some(versions) = secrets.get(&(mount.to_string(), key.to_string())) else {
            return error(404, "");
        };

        let requested = query
            .iter()
            .find(|(name, _)| name == "version")
            .and_then(|(_, value)| value.parse::<usize>().ok())
            .unwrap_or(versions.len());
        let Some(stored) = requested.checked_sub(1).and_then(|i| versions.get(i)) else {
            return error(404, "");
        };

        if stored.deleted {
            // Vault answers deleted versions with 404 but still sends metadata
            return VaultResponse::new(
                404,
                Some(json!({ "data": { "data": null, "metadata": metadata(requested, true) } })),
            );
        }
        ok(json!({ "data": { "data": stored.data, "metadata": metadata(requested, false) } }))
    }

    fn list(&self, mount: &str) -> VaultResponse {
        let secrets = self.secrets.lock().unwrap();
        let keys: BTreeSet<String> = secrets
            .keys()
            .filter(|(m, _)| m == mount)
            .map(|(_, key)| match key.split_once('/') {
                Some((dir, _)) => format!("{}/", dir),
                None => key.clone(),
            })
            .collect();

        if keys.is_empty() {
            return error(404, "");
        }
        ok(json!({ "data": { "keys": keys } }))
    }

    fn encrypt(&self, key_name: &str, body: Option<Value>) -> VaultResponse {
        let Some(plaintext) = body
            .as_ref()
            .and_then(|body| body.get("plaintext"))
            .and_then(Value::as_str)
        else {
            return error(400, "missing plaintext to encrypt");
        };
        if STANDARD.decode(plaintext).is_err() {
            return error(400, "failed to base64-decode plaintext");
        }

        let sealed = STANDARD.encode(format!("{}|{}", key_name, plaintext));
        ok(json!({ "data": { "ciphertext": format!("{}{}", CIPHERTEXT_PREFIX, sealed), "key_version": 1 } }))
    }

    fn decrypt(&self, key_name: &str, body: Option<Value>) -> VaultResponse {
        let Some(ciphertext) = body
            .as_ref()
            .and_then(|body| body.get("ciphertext"))
            .and_then(Value::as_str)
        else {
            return error(400, "missing ciphertext to decrypt");
        };
        let Some(sealed) = ciphertext.strip_prefix(CIPHERTEXT_PREFIX) else {
            return error(400, "invalid ciphertext: no prefix");
        };

        let opened = STANDARD
            .decode(sealed)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok());
        match opened.as_deref().and_then(|s| s.split_once('|')) {
            Some((key, plaintext)) if key == key_name => {
                ok(json!({ "data": { "plaintext": plaintext } }))
            }
            _ => error(400, "cipher: message authentication failed"),
        }
    }
}

#[async_trait]
impl Transport for InMemoryVault {
    async fn execute(&self, request: VaultRequest) -> Result<VaultResponse> {
        let _ = self.requests.fetch_add(1, Ordering::SeqCst);

        let path = request.path.as_str();
        let response = if path == "sys/health" {
            ok(json!({"initialized": true, "sealed": false, "standby": false, "version": "1.15.2"}))
        } else if let Some(key) = path.strip_prefix("transit/encrypt/") {
            self.encrypt(key, request.body)
        } else if let Some(key) = path.strip_prefix("transit/decrypt/") {
            self.decrypt(key, request.body)
        } else if let Some((mount, key)) = path.split_once("/data/") {
            match request.operation {
                Operation::Write => self.write(mount, key, request.body),
                _ => self.read(mount, key, &request.query),
            }
        } else if let Some(mount) = path.strip_suffix("/metadata/") {
            self.list(mount)
        } else {
            error(404, "")
        };
        Ok(response)
    }
}

fn metadata(version: usize, deleted: bool) -> Value {
    json!({
        "version": version,
        "created_time": CREATED_TIME,
        "deletion_time": if deleted { "2024-02-01T00:00:00Z" } else { "" },
        "destroyed": false,
    })
}

fn ok(body: Value) -> VaultResponse {
    VaultResponse::new(200, Some(body))
}

fn error(status: u16, message: &str) -> VaultResponse {
    let errors: Vec<&str> = if message.is_empty() { vec![] } else { vec![message] };
    VaultResponse::new(status, Some(json!({ "errors": errors })))
}

/// Service wired to a fresh in-memory Vault
pub fn service() -> (VaultService, Arc<InMemoryVault>) {
    let vault = InMemoryVault::new();
    let service = ClientBuilder::new("https://vault.test:8200")
        .auth(Auth::token("root"))
        .build_with_transport(vault.clone())
        .expect("Failed to build service");
    (service, vault)
}
