//! Authentication support for the Vault client
//!
//! Every request carries a credential obtained from the configured [`Auth`].
//! Obtaining and renewing the token itself (AppRole login, Kubernetes auth,
//! lease renewal) is left to the application; plug it in through a
//! [`TokenProvider`] and the client asks it for the current token before
//! each request.
//!
//! # Examples
//!
//! ## Fixed Token
//!
//! ```
//! use vault_versioned_sdk::Auth;
//!
//! // Vault token, sent as X-Vault-Token
//! let auth = Auth::token("hvs.CAESIJ");
//!
//! // Same token, sent as Authorization: Bearer
//! let auth = Auth::bearer("hvs.CAESIJ");
//! ```
//!
//! ## Token From a Vault Agent Sink
//!
//! ```
//! use vault_versioned_sdk::{Auth, SecretString, TokenProvider};
//! use std::path::PathBuf;
//!
//! /// Re-reads the file Vault Agent keeps the renewed token in
//! #[derive(Clone)]
//! struct AgentSink {
//!     path: PathBuf,
//! }
//!
//! #[async_trait::async_trait]
//! impl TokenProvider for AgentSink {
//!     async fn get_token(&self) -> Result<SecretString, Box<dyn std::error::Error + Send + Sync>> {
//!         let raw = std::fs::read_to_string(&self.path)?;
//!         Ok(SecretString::new(raw.trim().to_string()))
//!     }
//!
//!     fn clone_box(&self) -> Box<dyn TokenProvider> {
//!         Box::new(self.clone())
//!     }
//! }
//!
//! let auth = Auth::token_provider(AgentSink {
//!     path: PathBuf::from("/run/vault/agent-token"),
//! });
//! ```

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::fmt;

/// Header used by Vault for token authentication
pub(crate) const VAULT_TOKEN_HEADER: &str = "X-Vault-Token";

/// Authentication method for the Vault API
///
/// # Security
///
/// All credentials are stored using [`SecretString`] to prevent accidental
/// exposure in logs or debug output.
#[derive(Clone)]
pub enum Auth {
    /// Vault token, sent as `X-Vault-Token: <token>`
    Token(SecretString),
    /// Vault token sent as `Authorization: Bearer <token>`
    Bearer(SecretString),
    /// Dynamic token provider, consulted before every request
    TokenProvider(Box<dyn TokenProvider>),
}

impl Auth {
    /// Create a Vault token authentication
    pub fn token(token: impl Into<String>) -> Self {
        Auth::Token(SecretString::new(token.into()))
    }

    /// Send the token as `Authorization: Bearer`
    pub fn bearer(token: impl Into<String>) -> Self {
        Auth::Bearer(SecretString::new(token.into()))
    }

    /// Ask `provider` for the token before every request
    pub fn token_provider(provider: impl TokenProvider + 'static) -> Self {
        Auth::TokenProvider(Box::new(provider))
    }

    /// Header name and value carrying the current credential
    pub(crate) async fn get_header(
        &self,
    ) -> Result<(&'static str, String), Box<dyn std::error::Error + Send + Sync>> {
        match self {
            Auth::Token(token) => Ok((VAULT_TOKEN_HEADER, token.expose_secret().clone())),
            Auth::Bearer(token) => Ok(("Authorization", format!("Bearer {}", token.expose_secret()))),
            Auth::TokenProvider(provider) => {
                let token = provider.get_token().await?;
                Ok((VAULT_TOKEN_HEADER, token.expose_secret().clone()))
            }
        }
    }
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Auth::Token(_) => write!(f, "Auth::Token(****)"),
            Auth::Bearer(_) => write!(f, "Auth::Bearer(****)"),
            Auth::TokenProvider(_) => write!(f, "Auth::TokenProvider(****)"),
        }
    }
}

/// Trait for supplying the current Vault token
///
/// Implement this to hand the client tokens that are obtained or renewed
/// elsewhere. `get_token` is called before each request and should return
/// quickly, typically from a cached value.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Get the current token
    async fn get_token(&self) -> Result<SecretString, Box<dyn std::error::Error + Send + Sync>>;

    /// Clone the provider
    ///
    /// Typically implemented as `Box::new(self.clone())`.
    fn clone_box(&self) -> Box<dyn TokenProvider>;
}

impl Clone for Box<dyn TokenProvider> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Token provider that always returns the same token
#[derive(Clone)]
pub struct StaticTokenProvider {
    token: SecretString,
}

impl StaticTokenProvider {
    /// Wrap a fixed token
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: SecretString::new(token.into()),
        }
    }
}

impl fmt::Debug for StaticTokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StaticTokenProvider(****)")
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn get_token(&self) -> Result<SecretString, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.token.clone())
    }

    fn clone_box(&self) -> Box<dyn TokenProvider> {
        Box::new(self.clone())
    }
}
