//! API endpoint URL construction
//!
//! Paths handed to a [`Transport`](crate::Transport) are relative to `/v1/`;
//! [`Endpoints`] turns them into absolute URLs for the HTTP transport.

use crate::util::encode_path;

/// API v1 base path
pub const API_V1_BASE: &str = "/v1";

/// Health endpoint, relative to the API base
pub const SYS_HEALTH: &str = "sys/health";

/// Endpoint builder
#[derive(Debug, Clone)]
pub struct Endpoints {
    base_url: String,
}

impl Endpoints {
    /// Create a new endpoints builder
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Get the full URL for a path relative to `/v1/`
    pub fn url(&self, path: &str) -> String {
        format!("{}{}/{}", self.base_url, API_V1_BASE, path.trim_start_matches('/'))
    }
}

// KV v2

/// `{mount}/data/{key}`, used for reads and writes
pub fn kv_data(mount: &str, key: &str) -> String {
    format!("{}/data/{}", encode_path(mount), encode_path(key))
}

/// `{mount}/metadata/{path}/`, used for listing
pub fn kv_metadata_list(mount: &str, path: &str) -> String {
    let path = encode_path(path);
    if path.is_empty() {
        format!("{}/metadata/", encode_path(mount))
    } else {
        format!("{}/metadata/{}/", encode_path(mount), path)
    }
}

// Transit

/// `{mount}/encrypt/{key}`
pub fn transit_encrypt(mount: &str, key_name: &str) -> String {
    format!("{}/encrypt/{}", encode_path(mount), encode_path(key_name))
}

/// `{mount}/decrypt/{key}`
pub fn transit_decrypt(mount: &str, key_name: &str) -> String {
    format!("{}/decrypt/{}", encode_path(mount), encode_path(key_name))
}
