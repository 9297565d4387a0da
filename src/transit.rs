//! Transit encryption-as-a-service
//!
//! Plaintext is sent base64-encoded to `{mount}/encrypt/{key}` and the
//! ciphertext Vault returns (`vault:v<N>:...`) is passed back untouched.
//! Keys never leave Vault; creating or rotating them is done elsewhere.

use crate::{
    endpoints,
    errors::{Error, Result},
    kv::require,
    transport::{Transport, VaultRequest, VaultResponse},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;
use zeroize::Zeroizing;

/// Encrypt/decrypt pass-through to a transit mount
#[derive(Debug, Clone)]
pub struct TransitCipher {
    mount: String,
    transport: Arc<dyn Transport>,
}

#[derive(Deserialize)]
struct EncryptData {
    ciphertext: String,
}

#[derive(Deserialize)]
struct DecryptData {
    plaintext: String,
}

impl TransitCipher {
    /// Create a cipher for the transit engine mounted at `mount`
    pub fn new(mount: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            mount: mount.into(),
            transport,
        }
    }

    /// Mount path of the transit engine
    pub fn mount(&self) -> &str {
        &self.mount
    }

    /// Encrypt `plaintext` with the named transit key
    pub async fn encrypt(&self, key_name: &str, plaintext: &[u8]) -> Result<String> {
        let key_name = require("Transit key", key_name)?;

        let encoded = Zeroizing::new(STANDARD.encode(plaintext));
        let body = serde_json::json!({ "plaintext": encoded.as_str() });
        let request = VaultRequest::write(endpoints::transit_encrypt(&self.mount, key_name), body);

        let response = self.transport.execute(request).await?;
        let data: EncryptData = Self::data(response, Error::Encryption)?;
        debug!("Encrypted {} bytes with transit key {}", plaintext.len(), key_name);
        Ok(data.ciphertext)
    }

    /// Decrypt `ciphertext` with the named transit key
    pub async fn decrypt(&self, key_name: &str, ciphertext: &str) -> Result<Vec<u8>> {
        let key_name = require("Transit key", key_name)?;

        let body = serde_json::json!({ "ciphertext": ciphertext });
        let request = VaultRequest::write(endpoints::transit_decrypt(&self.mount, key_name), body);

        let response = self.transport.execute(request).await?;
        let data: DecryptData = Self::data(response, Error::Decryption)?;
        let plaintext = Zeroizing::new(data.plaintext);
        STANDARD
            .decode(plaintext.as_bytes())
            .map_err(|e| Error::Deserialize(format!("transit plaintext is not base64: {}", e)))
    }

    /// Unwrap the `data` object, turning a `400` into the given crypto error
    fn data<T: serde::de::DeserializeOwned>(
        response: VaultResponse,
        crypto_error: fn(String) -> Error,
    ) -> Result<T> {
        if response.status == 400 {
            return Err(match response.into_error() {
                Error::Http { message, .. } => crypto_error(message),
                other => other,
            });
        }
        if !response.is_success() {
            return Err(response.into_error());
        }
        Ok(serde_json::from_value(response.into_data()?)?)
    }
}
