//! Vault Versioned Secrets SDK for Rust
//!
//! A client for reading, writing and cryptographically transforming secrets
//! held by HashiCorp Vault: a versioned key/value (KV v2) engine plus the
//! transit engine for encryption-as-a-service.
//!
//! # Features
//!
//! - Async/await support with tokio runtime
//! - Versioned reads (latest or a specific version), scalar and map secrets
//! - "Not found" is an ordinary `None` / empty result, not an error
//! - Transit encrypt/decrypt pass-through
//! - One lazily created handle per mount, shared by concurrent callers
//! - Fails closed when configured against a non-versioned K/V engine
//! - Pluggable [`Transport`] for custom HTTP stacks and tests
//! - Secure credential handling with `secrecy`
//!
//! # Example
//!
//! ```no_run
//! use vault_versioned_sdk::{Auth, ClientBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let vault = ClientBuilder::new("https://vault.example.com:8200")
//!         .auth(Auth::token("hvs.CAESIJ"))
//!         .build()?;
//!
//!     if let Some(url) = vault.read_secret("secret", "database-url").await? {
//!         println!("Database URL has {} characters", url.len());
//!     }
//!
//!     Ok(())
//! }
//! ```

#![deny(missing_docs, missing_debug_implementations, unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod auth;
mod cache;
mod client;
mod config;
mod endpoints;
mod errors;
mod handle;
mod kv;
mod models;
mod service;
/// Telemetry and observability support
#[cfg(feature = "metrics")]
pub mod telemetry;

#[cfg(not(feature = "metrics"))]
mod telemetry;
#[cfg(test)]
mod testing;
mod transit;
mod transport;
mod util;

pub use auth::{Auth, StaticTokenProvider, TokenProvider};
pub use cache::{HandleCache, HandleStats};
pub use client::HttpTransport;
pub use config::{ClientBuilder, ClientConfig, KeyValueBackend};
pub use errors::{Error, ErrorKind, Result};
pub use handle::KvHandle;
pub use kv::VersionedSecrets;
pub use models::*;
pub use service::VaultService;
pub use transit::TransitCipher;
pub use transport::{Operation, Transport, VaultRequest, VaultResponse};

// Re-export commonly used types
pub use secrecy::SecretString;

/// SDK version, matches Cargo.toml version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Default transit engine mount path
pub const DEFAULT_TRANSIT_MOUNT: &str = "transit";
