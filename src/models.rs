//! Data models for the Vault client
//!
//! # Key Types
//!
//! * [`SecretRecord`] - Payload of a scalar secret, `{"value": "..."}`
//! * [`SecretMap`] - Payload of a composite secret, a flat string map
//! * [`Version`] - Selects the latest or a specific version on reads
//! * [`Versioned`] / [`VersionMetadata`] - A payload with its KV v2 version metadata
//! * [`HealthStatus`] - Body of `sys/health`

use crate::errors::Error;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::num::NonZeroU32;

/// Payload of a scalar secret
///
/// Stored in Vault as `{"value": "<value>"}`. The `value` field is required:
/// a payload without it fails to deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretRecord {
    /// The secret value (may be empty)
    pub value: String,
}

impl SecretRecord {
    /// Wrap a value
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

/// Payload of a composite secret
pub type SecretMap = HashMap<String, String>;

/// Version selector for reads
///
/// # Example
///
/// ```
/// use vault_versioned_sdk::Version;
///
/// let latest = Version::latest();
/// let third = Version::try_from(3).unwrap();
/// assert_eq!(third.number(), Some(3));
/// assert!(Version::try_from(0).is_err());
/// # let _ = latest;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Version {
    /// Whatever Vault currently considers the latest version
    #[default]
    Latest,
    /// An explicit version number
    Specific(NonZeroU32),
}

impl Version {
    /// The latest version
    pub fn latest() -> Self {
        Version::Latest
    }

    /// The explicit version number, if any
    pub fn number(&self) -> Option<u32> {
        match self {
            Version::Latest => None,
            Version::Specific(n) => Some(n.get()),
        }
    }
}

impl TryFrom<u32> for Version {
    type Error = Error;

    fn try_from(version: u32) -> Result<Self, Self::Error> {
        NonZeroU32::new(version)
            .map(Version::Specific)
            .ok_or_else(|| Error::invalid_argument("secret version must be a positive number"))
    }
}

impl From<NonZeroU32> for Version {
    fn from(version: NonZeroU32) -> Self {
        Version::Specific(version)
    }
}

/// Version metadata attached to every KV v2 secret version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionMetadata {
    /// Version number
    pub version: u32,
    /// Creation time (RFC 3339)
    #[serde(default)]
    pub created_time: String,
    /// Deletion time (RFC 3339), empty when not deleted
    #[serde(default)]
    pub deletion_time: String,
    /// Whether the version data was destroyed
    #[serde(default)]
    pub destroyed: bool,
}

impl VersionMetadata {
    /// Parsed creation time
    pub fn created_at(&self) -> Option<time::OffsetDateTime> {
        parse_rfc3339(&self.created_time)
    }

    /// Parsed deletion time, `None` when the version is live
    pub fn deleted_at(&self) -> Option<time::OffsetDateTime> {
        parse_rfc3339(&self.deletion_time)
    }
}

fn parse_rfc3339(s: &str) -> Option<time::OffsetDateTime> {
    if s.is_empty() {
        return None;
    }
    time::OffsetDateTime::parse(s, &time::format_description::well_known::Rfc3339).ok()
}

/// A secret payload together with its version metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned<T> {
    /// The payload
    pub data: T,
    /// Version metadata
    pub metadata: VersionMetadata,
}

impl<T> Versioned<T> {
    /// Version number of this payload
    pub fn version(&self) -> u32 {
        self.metadata.version
    }

    /// Transform the payload, keeping the metadata
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Versioned<U> {
        Versioned {
            data: f(self.data),
            metadata: self.metadata,
        }
    }
}

/// Body of `sys/health`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HealthStatus {
    /// Whether Vault is initialized
    pub initialized: bool,
    /// Whether Vault is sealed
    pub sealed: bool,
    /// Whether this node is a standby
    #[serde(default)]
    pub standby: bool,
    /// Server version
    pub version: String,
    /// Cluster name
    #[serde(default)]
    pub cluster_name: Option<String>,
    /// Cluster ID
    #[serde(default)]
    pub cluster_id: Option<String>,
    /// Server time (Unix seconds)
    #[serde(default)]
    pub server_time_utc: Option<i64>,
}
