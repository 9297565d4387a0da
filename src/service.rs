//! Vault service facade
//!
//! [`VaultService`] is the single entry point for applications: it exposes
//! server metadata, versioned key/value secret operations and transit
//! encryption.
//!
//! # Architecture
//!
//! - **Transport**: every call goes through one [`Transport`], by default the
//!   `reqwest`-based [`HttpTransport`](crate::HttpTransport)
//! - **Handle cache**: one [`KvHandle`](crate::KvHandle) per mount path,
//!   created lazily and shared by all callers
//! - **Transit**: encrypt/decrypt pass-through to the configured transit mount
//!
//! The service is cheap to clone; clones share the transport and handle
//! cache, so one instance can serve many concurrent tasks.
//!
//! # Examples
//!
//! ```no_run
//! use vault_versioned_sdk::{Auth, ClientBuilder, SecretMap};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let vault = ClientBuilder::new("https://vault.example.com:8200")
//!     .auth(Auth::token("hvs.CAESIJ"))
//!     .build()?;
//!
//! vault.write_secret("secret", "api-key", "s3cr3t").await?;
//! let value = vault.read_secret("secret", "api-key").await?;
//! assert_eq!(value.as_deref(), Some("s3cr3t"));
//!
//! let mut db = SecretMap::new();
//! db.insert("username".to_string(), "app".to_string());
//! db.insert("password".to_string(), "hunter2".to_string());
//! vault.write_secret_map("secret", "database", &db).await?;
//! # Ok(())
//! # }
//! ```

use crate::{
    cache::{HandleCache, HandleStats},
    client::HttpTransport,
    config::{ClientConfig, KeyValueBackend},
    endpoints,
    errors::{Error, Result},
    kv::VersionedSecrets,
    models::{HealthStatus, SecretMap, Version, VersionMetadata, Versioned},
    transit::TransitCipher,
    transport::{Transport, VaultRequest},
};
use std::sync::Arc;
use tracing::debug;

/// Status codes for which `sys/health` still returns a health body
const HEALTH_STATUSES: [u16; 6] = [200, 429, 472, 473, 501, 503];

/// Vault client for versioned secrets and transit encryption
#[derive(Clone)]
pub struct VaultService {
    config: Arc<ClientConfig>,
    transport: Arc<dyn Transport>,
    secrets: VersionedSecrets,
    transit: TransitCipher,
}

impl std::fmt::Debug for VaultService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultService")
            .field("address", &self.config.address)
            .field("namespace", &self.config.namespace)
            .field("transit_mount", &self.config.transit_mount)
            .field("handles_created", &self.handle_stats().created())
            .finish()
    }
}

impl VaultService {
    /// Create a service talking to Vault over HTTP(S)
    ///
    /// # Errors
    ///
    /// * `Error::UnsupportedBackend` if the K/V backend is not version 2
    /// * `Error::Config` if the HTTP client cannot be built
    pub fn new(config: ClientConfig) -> Result<Self> {
        ensure_versioned(&config)?;
        let transport = Arc::new(HttpTransport::new(config.clone())?);
        Self::with_transport(config, transport)
    }

    /// Create a service on top of a custom transport
    ///
    /// # Errors
    ///
    /// * `Error::UnsupportedBackend` if the K/V backend is not version 2
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        ensure_versioned(&config)?;

        debug!(
            "Vault service for {} (transit mount: {})",
            config.address, config.transit_mount
        );
        Ok(Self {
            secrets: VersionedSecrets::new(HandleCache::new(transport.clone())),
            transit: TransitCipher::new(config.transit_mount.clone(), transport.clone()),
            transport,
            config: Arc::new(config),
        })
    }

    /// The configuration this service was built with
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Handle cache statistics
    pub fn handle_stats(&self) -> &HandleStats {
        self.secrets.handles().stats()
    }

    /// Get the Vault server health
    ///
    /// Sealed, standby and uninitialized servers answer with a non-200
    /// status but still report their health, which is returned as-is.
    pub async fn health(&self) -> Result<HealthStatus> {
        let response = self
            .transport
            .execute(VaultRequest::read(endpoints::SYS_HEALTH))
            .await?;

        if !HEALTH_STATUSES.contains(&response.status) {
            return Err(response.into_error());
        }
        match response.body {
            Some(body) => Ok(serde_json::from_value(body)?),
            None => Err(Error::Http {
                status: response.status,
                message: "empty health response".to_string(),
                request_id: response.request_id,
            }),
        }
    }

    /// Get the Vault server version
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use vault_versioned_sdk::VaultService;
    /// # async fn example(vault: &VaultService) -> Result<(), Box<dyn std::error::Error>> {
    /// println!("Vault {}", vault.server_version().await?);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn server_version(&self) -> Result<String> {
        Ok(self.health().await?.version)
    }

    /// Encrypt `plaintext` with the named transit key
    ///
    /// Returns Vault's ciphertext (`vault:v<N>:...`) unchanged.
    pub async fn encrypt(&self, key_name: &str, plaintext: &[u8]) -> Result<String> {
        self.transit.encrypt(key_name, plaintext).await
    }

    /// Decrypt `ciphertext` with the named transit key
    ///
    /// # Errors
    ///
    /// * `Error::Decryption` if Vault rejects the ciphertext or key
    pub async fn decrypt(&self, key_name: &str, ciphertext: &str) -> Result<Vec<u8>> {
        self.transit.decrypt(key_name, ciphertext).await
    }

    /// Write a scalar secret as a new version of `mount/key`
    ///
    /// The value is stored as `{"value": "<value>"}`.
    pub async fn write_secret(
        &self,
        mount: &str,
        key: &str,
        value: &str,
    ) -> Result<VersionMetadata> {
        self.secrets.write_scalar(mount, key, value).await
    }

    /// Read the latest version of a scalar secret
    ///
    /// Returns `None` if the secret does not exist.
    pub async fn read_secret(&self, mount: &str, key: &str) -> Result<Option<String>> {
        self.read_secret_version(mount, key, Version::Latest).await
    }

    /// Read a specific version of a scalar secret
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use vault_versioned_sdk::{VaultService, Version};
    /// # async fn example(vault: &VaultService) -> Result<(), Box<dyn std::error::Error>> {
    /// let previous = vault
    ///     .read_secret_version("secret", "api-key", Version::try_from(1)?)
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn read_secret_version(
        &self,
        mount: &str,
        key: &str,
        version: Version,
    ) -> Result<Option<String>> {
        self.secrets.read_scalar(mount, key, version).await
    }

    /// Read a scalar secret together with its version metadata
    pub async fn read_versioned_secret(
        &self,
        mount: &str,
        key: &str,
        version: Version,
    ) -> Result<Option<Versioned<String>>> {
        self.secrets.read_scalar_versioned(mount, key, version).await
    }

    /// Write a composite secret as a new version of `mount/key`
    ///
    /// The map replaces every field of the previous version. An empty map
    /// is not written and yields `Ok(None)`.
    pub async fn write_secret_map(
        &self,
        mount: &str,
        key: &str,
        map: &SecretMap,
    ) -> Result<Option<VersionMetadata>> {
        self.secrets.write_map(mount, key, map).await
    }

    /// Read the latest version of a composite secret
    ///
    /// Returns an empty map if the secret does not exist.
    pub async fn read_secret_map(&self, mount: &str, key: &str) -> Result<SecretMap> {
        self.read_secret_map_version(mount, key, Version::Latest).await
    }

    /// Read a specific version of a composite secret
    pub async fn read_secret_map_version(
        &self,
        mount: &str,
        key: &str,
        version: Version,
    ) -> Result<SecretMap> {
        self.secrets.read_map(mount, key, version).await
    }

    /// List the secret names at the root of `mount`
    ///
    /// Nested paths are returned with a trailing `/`.
    pub async fn list_secrets(&self, mount: &str) -> Result<Vec<String>> {
        self.secrets.list(mount).await
    }
}

/// Fail closed unless the K/V backend keeps secret versions
fn ensure_versioned(config: &ClientConfig) -> Result<()> {
    if config.kv_backend != KeyValueBackend::V2 {
        return Err(Error::UnsupportedBackend(
            "Must be a kv2 backend to support versioned secrets".to_string(),
        ));
    }
    Ok(())
}
