//! Transport abstraction between the secret operations and Vault
//!
//! The core never talks HTTP directly. It describes each call as a
//! [`VaultRequest`] and interprets the [`VaultResponse`] status itself, so a
//! transport only has to move bytes: it returns `Err` for transport failures
//! (connection refused, timeout, TLS) and `Ok` for any HTTP answer, including
//! `404` and `5xx`.
//!
//! [`HttpTransport`](crate::HttpTransport) is the production implementation.

use crate::errors::{Error, ErrorResponse, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

/// Kind of Vault operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// `GET`
    Read,
    /// `POST` with a JSON body
    Write,
    /// `LIST` (sent as `GET ?list=true` over HTTP)
    List,
}

impl Operation {
    /// Lowercase label used in logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Read => "read",
            Operation::Write => "write",
            Operation::List => "list",
        }
    }
}

/// A single request to Vault
#[derive(Debug, Clone)]
pub struct VaultRequest {
    /// Operation kind
    pub operation: Operation,
    /// Path relative to `/v1/`, already percent-encoded
    pub path: String,
    /// Query parameters
    pub query: Vec<(String, String)>,
    /// JSON body for writes
    pub body: Option<Value>,
}

impl VaultRequest {
    /// Create a read request
    pub fn read(path: impl Into<String>) -> Self {
        Self {
            operation: Operation::Read,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    /// Create a write request with a JSON body
    pub fn write(path: impl Into<String>, body: Value) -> Self {
        Self {
            operation: Operation::Write,
            path: path.into(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    /// Create a list request
    pub fn list(path: impl Into<String>) -> Self {
        Self {
            operation: Operation::List,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    /// Add a query parameter
    pub fn with_query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((name.into(), value.to_string()));
        self
    }
}

/// Raw answer from Vault
#[derive(Debug, Clone)]
pub struct VaultResponse {
    /// HTTP status code
    pub status: u16,
    /// Parsed JSON body, `None` when the body was empty
    pub body: Option<Value>,
    /// Request ID associated with the call
    pub request_id: Option<String>,
}

impl VaultResponse {
    /// Create a response with the given status and body
    pub fn new(status: u16, body: Option<Value>) -> Self {
        Self {
            status,
            body,
            request_id: None,
        }
    }

    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether Vault reported the path as absent
    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    /// Convert a non-success response into an [`Error::Http`]
    pub(crate) fn into_error(self) -> Error {
        let message = self
            .body
            .and_then(|body| serde_json::from_value::<ErrorResponse>(body).ok())
            .unwrap_or_default()
            .message(self.status);
        Error::Http {
            status: self.status,
            message,
            request_id: self.request_id,
        }
    }

    /// Take the `data` object out of a success body
    pub(crate) fn into_data(self) -> Result<Value> {
        match self.body {
            Some(Value::Object(mut map)) => map
                .remove("data")
                .filter(|data| !data.is_null())
                .ok_or_else(|| Error::Deserialize("response has no data field".to_string())),
            Some(_) => Err(Error::Deserialize("response body is not an object".to_string())),
            None => Err(Error::Deserialize("empty response body".to_string())),
        }
    }
}

/// Moves requests to Vault and brings back the responses
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    /// Execute a request
    ///
    /// Returns `Err` only when no HTTP answer was obtained.
    async fn execute(&self, request: VaultRequest) -> Result<VaultResponse>;
}
