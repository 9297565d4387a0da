//! Per-mount accessor for a KV v2 secrets engine

use crate::{
    endpoints,
    errors::{Error, Result},
    kv::{check_segments, require},
    models::{Version, VersionMetadata, Versioned},
    transport::{Transport, VaultRequest},
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, trace};

/// Operations against one KV v2 mount
///
/// Handles are created by the [`HandleCache`](crate::HandleCache) and live as
/// long as the service that owns it. They hold no state besides the mount
/// path, so calls through a shared handle need no locking.
#[derive(Debug)]
pub struct KvHandle {
    mount: String,
    transport: Arc<dyn Transport>,
}

/// `data` object of a KV v2 read response
#[derive(Deserialize)]
struct KvEntry {
    #[serde(default)]
    data: Option<Value>,
    metadata: VersionMetadata,
}

impl KvHandle {
    pub(crate) fn new(mount: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            mount: mount.into(),
            transport,
        }
    }

    /// Mount path this handle is bound to
    pub fn mount(&self) -> &str {
        &self.mount
    }

    /// `{mount}/data/{key}`, refusing mounts that would leave their own path
    fn data_path(&self, key: &str) -> Result<String> {
        check_segments("Vault K/V path", &self.mount)?;
        Ok(endpoints::kv_data(&self.mount, key))
    }

    /// Read a secret version and deserialize its payload
    ///
    /// Returns `None` when the key or version does not exist, or when the
    /// version was deleted or destroyed.
    pub async fn get<T: DeserializeOwned>(
        &self,
        key: &str,
        version: Version,
    ) -> Result<Option<Versioned<T>>> {
        let key = require("Secret key", key)?;
        let mut request = VaultRequest::read(self.data_path(key)?);
        if let Some(number) = version.number() {
            request = request.with_query("version", number);
        }

        let response = self.transport.execute(request).await?;
        if response.is_not_found() {
            trace!("No secret at {}/{} ({:?})", self.mount, key, version);
            return Ok(None);
        }
        if !response.is_success() {
            return Err(response.into_error());
        }

        let entry: KvEntry = serde_json::from_value(response.into_data()?)?;
        let Some(data) = entry.data.filter(|data| !data.is_null()) else {
            debug!(
                "Secret {}/{} version {} has no data (deleted or destroyed)",
                self.mount, key, entry.metadata.version
            );
            return Ok(None);
        };

        let data = serde_json::from_value(data).map_err(|e| {
            Error::Deserialize(format!(
                "secret {}/{} version {}: {}",
                self.mount, key, entry.metadata.version, e
            ))
        })?;
        Ok(Some(Versioned {
            data,
            metadata: entry.metadata,
        }))
    }

    /// Write a new version of a secret
    ///
    /// The payload replaces the previous version entirely.
    pub async fn put<T: Serialize>(&self, key: &str, data: &T) -> Result<VersionMetadata> {
        let key = require("Secret key", key)?;
        let body = serde_json::json!({ "data": data });
        let request = VaultRequest::write(self.data_path(key)?, body);

        let response = self.transport.execute(request).await?;
        if !response.is_success() {
            return Err(response.into_error());
        }

        let metadata: VersionMetadata = serde_json::from_value(response.into_data()?)?;
        debug!("Wrote {}/{} version {}", self.mount, key, metadata.version);
        Ok(metadata)
    }

    /// List key names directly under `path` (`""` for the mount root)
    ///
    /// Sub-directories keep their trailing `/`. An empty or missing
    /// directory yields an empty list.
    pub async fn list(&self, path: &str) -> Result<Vec<String>> {
        #[derive(Deserialize)]
        struct KeyList {
            #[serde(default)]
            keys: Vec<String>,
        }

        check_segments("Vault K/V path", &self.mount)?;
        check_segments("List path", path)?;
        let request = VaultRequest::list(endpoints::kv_metadata_list(&self.mount, path));
        let response = self.transport.execute(request).await?;
        if response.is_not_found() {
            return Ok(Vec::new());
        }
        if !response.is_success() {
            return Err(response.into_error());
        }

        let list: KeyList = serde_json::from_value(response.into_data()?)?;
        Ok(list.keys)
    }
}
