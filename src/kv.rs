//! Versioned key/value secret operations
//!
//! Scalar secrets are stored as `{"value": "..."}` ([`SecretRecord`]);
//! composite secrets as a flat string map ([`SecretMap`]). Every write creates
//! a new version holding the full payload; reads pick the latest version or
//! an explicit one, and a missing key or version reads as absent.

use crate::{
    cache::HandleCache,
    errors::{Error, Result},
    models::{SecretMap, SecretRecord, Version, VersionMetadata, Versioned},
    util::trim_path,
};
use tracing::{debug, trace};

/// Validate a required path-like argument
///
/// Surrounding slashes are stripped, so `"/secret/"` and `"secret"` address
/// the same mount. Blank values, surrounding whitespace and `.` / `..`
/// segments are rejected: the value is never rewritten into another path.
pub(crate) fn require<'a>(name: &str, value: &'a str) -> Result<&'a str> {
    let trimmed = trim_path(value);
    if trim_path(trimmed.trim()).is_empty() {
        return Err(Error::invalid_argument(format!("{} must be specified", name)));
    }
    if trimmed.trim() != trimmed {
        return Err(Error::invalid_argument(format!(
            "{} must not start or end with whitespace",
            name
        )));
    }
    check_segments(name, trimmed)?;
    Ok(trimmed)
}

/// Reject `.` and `..` segments, which HTTP clients resolve against the
/// request path and would move the call outside the mount
pub(crate) fn check_segments(name: &str, path: &str) -> Result<()> {
    if path.split('/').any(|segment| segment == "." || segment == "..") {
        return Err(Error::invalid_argument(format!(
            "{} must not contain '.' or '..' segments",
            name
        )));
    }
    Ok(())
}

/// Read and write operations over the handles of a [`HandleCache`]
#[derive(Debug, Clone)]
pub struct VersionedSecrets {
    handles: HandleCache,
}

impl VersionedSecrets {
    /// Create the accessor over `handles`
    pub fn new(handles: HandleCache) -> Self {
        Self { handles }
    }

    /// The underlying handle cache
    pub fn handles(&self) -> &HandleCache {
        &self.handles
    }

    /// Write `value` as a new version of the scalar secret `mount/key`
    pub async fn write_scalar(
        &self,
        mount: &str,
        key: &str,
        value: &str,
    ) -> Result<VersionMetadata> {
        let mount = require("Vault K/V path", mount)?;
        let key = require("Secret key", key)?;

        let handle = self.handles.get_or_create(mount);
        handle.put(key, &SecretRecord::new(value)).await
    }

    /// Read the scalar secret `mount/key` with its version metadata
    pub async fn read_scalar_versioned(
        &self,
        mount: &str,
        key: &str,
        version: Version,
    ) -> Result<Option<Versioned<String>>> {
        let mount = require("Vault K/V path", mount)?;
        let key = require("Secret key", key)?;

        let handle = self.handles.get_or_create(mount);
        let record = handle.get::<SecretRecord>(key, version).await?;
        Ok(record.map(|versioned| versioned.map(|record| record.value)))
    }

    /// Read the scalar secret `mount/key`
    pub async fn read_scalar(
        &self,
        mount: &str,
        key: &str,
        version: Version,
    ) -> Result<Option<String>> {
        Ok(self
            .read_scalar_versioned(mount, key, version)
            .await?
            .map(|versioned| versioned.data))
    }

    /// Write `map` as a new version of the composite secret `mount/key`
    ///
    /// The map replaces all fields of the previous version. An empty map is
    /// skipped without contacting Vault and returns `None`.
    pub async fn write_map(
        &self,
        mount: &str,
        key: &str,
        map: &SecretMap,
    ) -> Result<Option<VersionMetadata>> {
        let mount = require("Vault K/V path", mount)?;
        let key = require("Secret key", key)?;

        if map.is_empty() {
            debug!("Skipping write of empty map to {}/{}", mount, key);
            return Ok(None);
        }

        let handle = self.handles.get_or_create(mount);
        handle.put(key, map).await.map(Some)
    }

    /// Read the composite secret `mount/key`
    ///
    /// Returns an empty map when the key or version does not exist. Fields
    /// whose values are not strings fail the read with
    /// [`Error::Deserialize`].
    pub async fn read_map(&self, mount: &str, key: &str, version: Version) -> Result<SecretMap> {
        let mount = require("Vault K/V path", mount)?;
        let key = require("Secret key", key)?;

        let handle = self.handles.get_or_create(mount);
        let map = handle.get::<SecretMap>(key, version).await?;
        Ok(map.map(|versioned| versioned.data).unwrap_or_default())
    }

    /// List secret names directly under the root of `mount`
    pub async fn list(&self, mount: &str) -> Result<Vec<String>> {
        let mount = require("Vault K/V path", mount)?;

        let handle = self.handles.get_or_create(mount);
        let keys = handle.list("").await?;
        trace!("Listed {} keys under {}", keys.len(), mount);
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedTransport;
    use crate::transport::Operation;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    fn accessor() -> (VersionedSecrets, Arc<ScriptedTransport>) {
        let transport = Arc::new(ScriptedTransport::default());
        let secrets = VersionedSecrets::new(HandleCache::new(transport.clone()));
        (secrets, transport)
    }

    fn metadata(version: u32) -> serde_json::Value {
        json!({
            "created_time": "2024-01-01T00:00:00Z",
            "deletion_time": "",
            "destroyed": false,
            "version": version
        })
    }

    #[test]
    fn test_require() {
        assert_eq!(require("path", "secret").unwrap(), "secret");
        assert_eq!(require("path", "/team/kv/").unwrap(), "team/kv");
        assert!(matches!(require("path", ""), Err(Error::InvalidArgument(_))));
        assert!(matches!(require("path", " / "), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_require_keeps_key_verbatim() {
        assert_eq!(require("key", "team/db-pass").unwrap(), "team/db-pass");
        assert_eq!(require("key", "v1.2").unwrap(), "v1.2");
        assert!(matches!(require("key", " db "), Err(Error::InvalidArgument(_))));
        assert!(matches!(require("key", "db\t"), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_require_rejects_dot_segments() {
        for value in ["..", "../sys", "a/../../sys/policies/acl/evil", "./db", "team/./db", "/../"] {
            assert!(
                matches!(require("key", value), Err(Error::InvalidArgument(_))),
                "{} was accepted",
                value
            );
        }
    }

    #[tokio::test]
    async fn test_traversing_key_sends_nothing() {
        let (secrets, transport) = accessor();

        let write = secrets
            .write_scalar("secret", "../../sys/policies/acl/evil", "x")
            .await;
        assert!(matches!(write, Err(Error::InvalidArgument(_))));

        let read = secrets.read_scalar("secret", "a/../../b", Version::Latest).await;
        assert!(matches!(read, Err(Error::InvalidArgument(_))));

        let list = secrets.list("secret/..").await;
        assert!(matches!(list, Err(Error::InvalidArgument(_))));

        assert!(transport.requests().is_empty());
        assert_eq!(secrets.handles().stats().created(), 0);
    }

    #[tokio::test]
    async fn test_padded_key_is_rejected() {
        let (secrets, transport) = accessor();

        let err = secrets.read_scalar("secret", " db ", Version::Latest).await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_write_scalar_wraps_value() {
        let (secrets, transport) = accessor();
        let _ = transport.respond(200, json!({"data": metadata(1)}));

        let written = secrets.write_scalar("secret", "db", "hunter2").await.unwrap();
        assert_eq!(written.version, 1);

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].operation, Operation::Write);
        assert_eq!(requests[0].path, "secret/data/db");
        assert_eq!(requests[0].body, Some(json!({"data": {"value": "hunter2"}})));
    }

    #[tokio::test]
    async fn test_read_scalar_specific_version() {
        let (secrets, transport) = accessor();
        let _ = transport.respond(
            200,
            json!({"data": {"data": {"value": "old"}, "metadata": metadata(2)}}),
        );

        let value = secrets
            .read_scalar_versioned("secret", "db", Version::try_from(2).unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(value.data, "old");
        assert_eq!(value.version(), 2);

        let requests = transport.requests();
        assert_eq!(requests[0].operation, Operation::Read);
        assert_eq!(requests[0].query, vec![("version".to_string(), "2".to_string())]);
    }

    #[tokio::test]
    async fn test_read_scalar_missing_is_none() {
        let (secrets, _transport) = accessor();
        let value = secrets.read_scalar("secret", "nope", Version::Latest).await.unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn test_read_scalar_deleted_version_is_none() {
        let (secrets, transport) = accessor();
        let mut deleted = metadata(3);
        deleted["deletion_time"] = json!("2024-02-01T00:00:00Z");
        let _ = transport.respond(200, json!({"data": {"data": null, "metadata": deleted}}));

        let value = secrets.read_scalar("secret", "db", Version::Latest).await.unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn test_read_scalar_without_value_field_is_rejected() {
        let (secrets, transport) = accessor();
        let _ = transport.respond(
            200,
            json!({"data": {"data": {"password": "x"}, "metadata": metadata(1)}}),
        );

        let err = secrets.read_scalar("secret", "db", Version::Latest).await.unwrap_err();
        assert!(matches!(err, Error::Deserialize(_)));
    }

    #[tokio::test]
    async fn test_empty_map_is_not_written() {
        let (secrets, transport) = accessor();

        let written = secrets.write_map("secret", "app", &SecretMap::new()).await.unwrap();
        assert_eq!(written, None);
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_read_map_rejects_non_string_values() {
        let (secrets, transport) = accessor();
        let _ = transport.respond(
            200,
            json!({"data": {"data": {"user": "app", "port": 5432}, "metadata": metadata(1)}}),
        );

        let err = secrets.read_map("secret", "app", Version::Latest).await.unwrap_err();
        assert!(matches!(err, Error::Deserialize(_)));
    }

    #[tokio::test]
    async fn test_read_map_missing_is_empty() {
        let (secrets, _transport) = accessor();
        let map = secrets.read_map("secret", "nope", Version::Latest).await.unwrap();
        assert!(map.is_empty());
    }

    #[tokio::test]
    async fn test_server_error_propagates() {
        let (secrets, transport) = accessor();
        let _ = transport.respond(503, json!({"errors": ["Vault is sealed"]}));

        let err = secrets.read_scalar("secret", "db", Version::Latest).await.unwrap_err();
        assert_eq!(err.status_code(), Some(503));
        assert_eq!(err.kind(), crate::ErrorKind::BackendUnavailable);
    }

    #[tokio::test]
    async fn test_invalid_arguments_make_no_calls() {
        let (secrets, transport) = accessor();

        assert!(matches!(
            secrets.write_scalar("", "db", "v").await,
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            secrets.read_scalar("secret", "", Version::Latest).await,
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(secrets.list("/").await, Err(Error::InvalidArgument(_))));
        assert!(transport.requests().is_empty());
        assert_eq!(secrets.handles().stats().created(), 0);
    }

    #[tokio::test]
    async fn test_list_root() {
        let (secrets, transport) = accessor();
        let _ = transport.respond(200, json!({"data": {"keys": ["x", "y", "nested/"]}}));

        let keys = secrets.list("secret").await.unwrap();
        assert_eq!(keys, vec!["x", "y", "nested/"]);
        assert_eq!(transport.requests()[0].operation, Operation::List);
        assert_eq!(transport.requests()[0].path, "secret/metadata/");
    }

    #[tokio::test]
    async fn test_list_empty_mount() {
        let (secrets, _transport) = accessor();
        assert!(secrets.list("secret").await.unwrap().is_empty());
    }
}
