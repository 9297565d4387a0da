//! Error types and handling for the Vault client
//!
//! Every operation returns [`Result`]. Errors carry enough context for
//! debugging (status, request id, Vault's own error strings) but never
//! include secret values.
//!
//! # Error Categories
//!
//! - **Invalid argument**: an empty mount path, key or transit key name,
//!   rejected before any network call
//! - **Unsupported backend**: the client was configured for a non-versioned
//!   key/value engine
//! - **Backend unavailable**: HTTP errors, network failures and timeouts
//! - **Encryption / Decryption**: the transit engine refused the operation
//! - **Deserialization**: the backend answered with an unexpected shape
//!
//! A secret that does not exist is *not* an error: reads return `None` or an
//! empty map.
//!
//! # Example
//!
//! ```no_run
//! # use vault_versioned_sdk::{VaultService, Error, ErrorKind};
//! # async fn example(vault: &VaultService) -> Result<(), Box<dyn std::error::Error>> {
//! match vault.read_secret("secret", "database-url").await {
//!     Ok(Some(_)) => println!("Found secret"),
//!     Ok(None) => println!("Secret not found"),
//!     Err(e) if e.kind() == ErrorKind::BackendUnavailable => println!("Vault is down: {}", e),
//!     Err(Error::InvalidArgument(msg)) => println!("Bad call: {}", msg),
//!     Err(e) => return Err(e.into()),
//! }
//! # Ok(())
//! # }
//! ```

use thiserror::Error;

/// Result of a Vault client operation
pub type Result<T> = std::result::Result<T, Error>;

/// Error returned by Vault client operations
#[derive(Error, Debug)]
pub enum Error {
    /// A required argument was empty
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The configured key/value engine does not support versioned secrets
    #[error("unsupported backend configuration: {0}")]
    UnsupportedBackend(String),

    /// Non-success HTTP response from Vault
    #[error("http {status}: {message} (req={request_id:?})")]
    Http {
        /// HTTP status code
        status: u16,
        /// Error messages reported by Vault, joined with `; `
        message: String,
        /// Request ID sent with the request
        request_id: Option<String>,
    },

    /// Transit engine rejected an encryption request
    #[error("encryption: {0}")]
    Encryption(String),

    /// Transit engine rejected a decryption request
    #[error("decryption: {0}")]
    Decryption(String),

    /// Deserialization error
    #[error("deserialize: {0}")]
    Deserialize(String),

    /// Network error
    #[error("network: {0}")]
    Network(String),

    /// Request timeout
    #[error("timeout")]
    Timeout,

    /// Configuration error
    #[error("config: {0}")]
    Config(String),

    /// Other errors
    #[error("other: {0}")]
    Other(String),
}

/// Coarse error categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Empty or otherwise unusable argument
    InvalidArgument,
    /// The key/value engine is not the versioned (v2) kind
    UnsupportedBackendConfiguration,
    /// Network failure, timeout or non-success response from Vault
    BackendUnavailable,
    /// Transit encryption failure
    Encryption,
    /// Transit decryption failure
    Decryption,
    /// Unexpected response payload
    Deserialize,
    /// Configuration error
    Config,
    /// Other/unknown error
    Other,
}

impl Error {
    /// Get the error kind for categorization
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Error::UnsupportedBackend(_) => ErrorKind::UnsupportedBackendConfiguration,
            Error::Http { .. } | Error::Network(_) | Error::Timeout => {
                ErrorKind::BackendUnavailable
            }
            Error::Encryption(_) => ErrorKind::Encryption,
            Error::Decryption(_) => ErrorKind::Decryption,
            Error::Deserialize(_) => ErrorKind::Deserialize,
            Error::Config(_) => ErrorKind::Config,
            Error::Other(_) => ErrorKind::Other,
        }
    }

    /// Check if the error is transient
    ///
    /// The SDK never retries on its own; this is a hint for callers that do.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http { status, .. } => matches!(status, 429 | 500 | 502 | 503 | 504),
            Error::Network(_) => true,
            Error::Timeout => true,
            _ => false,
        }
    }

    /// Get the HTTP status code if this is an HTTP error
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Get the request ID if available
    pub fn request_id(&self) -> Option<&str> {
        match self {
            Error::Http { request_id, .. } => request_id.as_deref(),
            _ => None,
        }
    }

    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        Error::InvalidArgument(message.into())
    }
}

/// Vault error body: `{"errors": ["..."]}`
#[derive(Debug, Default, serde::Deserialize)]
pub(crate) struct ErrorResponse {
    #[serde(default)]
    pub errors: Vec<String>,
}

impl ErrorResponse {
    /// Join Vault's error strings, falling back to a generic message
    pub fn message(&self, status: u16) -> String {
        if self.errors.is_empty() {
            format!("HTTP error {}", status)
        } else {
            self.errors.join("; ")
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout
        } else if err.is_connect() || err.is_request() {
            Error::Network(err.to_string())
        } else if err.is_decode() {
            Error::Deserialize(err.to_string())
        } else {
            Error::Other(err.to_string())
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Deserialize(err.to_string())
    }
}
