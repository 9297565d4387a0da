use crate::{auth::Auth, errors::Result, telemetry::TelemetryConfig, transport::Transport, Error};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Key/value secrets engine version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyValueBackend {
    /// KV version 1, unversioned
    V1,
    /// KV version 2, versioned
    #[default]
    V2,
}

impl KeyValueBackend {
    /// Parse `"1"`, `"2"`, `"v1"`, `"kv-2"` and similar spellings
    pub fn parse(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase();
        let version = normalized
            .trim_start_matches("kv")
            .trim_start_matches(['-', '_'])
            .trim_start_matches('v');
        match version {
            "1" => Ok(KeyValueBackend::V1),
            "2" => Ok(KeyValueBackend::V2),
            _ => Err(Error::Config(format!("Unknown K/V backend version: {}", s))),
        }
    }
}

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Vault address, e.g. `https://vault.example.com:8200`
    pub address: String,
    /// Authentication configuration
    pub auth: Auth,
    /// Enterprise namespace, sent as `X-Vault-Namespace`
    pub namespace: Option<String>,
    /// Key/value engine version the mounts are configured with
    pub kv_backend: KeyValueBackend,
    /// Mount path of the transit engine
    pub transit_mount: String,
    /// Request timeout
    pub timeout: Duration,
    /// User agent suffix
    pub user_agent_suffix: Option<String>,
    /// Additional trusted root certificate (PEM)
    pub ca_cert_pem: Option<Vec<u8>>,
    /// Telemetry configuration
    pub telemetry_config: TelemetryConfig,
    /// Allow plain HTTP to non-loopback hosts (only with danger-insecure-http feature)
    pub allow_insecure_http: bool,
}

/// Builder for creating a configured [`VaultService`](crate::VaultService)
#[derive(Debug)]
pub struct ClientBuilder {
    address: String,
    auth: Option<Auth>,
    namespace: Option<String>,
    kv_backend: KeyValueBackend,
    transit_mount: String,
    timeout_ms: u64,
    user_agent_suffix: Option<String>,
    ca_cert_pem: Option<Vec<u8>>,
    telemetry_config: TelemetryConfig,
    allow_insecure_http: bool,
}

impl ClientBuilder {
    /// Create a new client builder with the given Vault address
    ///
    /// # Arguments
    ///
    /// * `address` - Vault address (e.g., `"https://vault.example.com:8200"`)
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            auth: None,
            namespace: None,
            kv_backend: KeyValueBackend::V2,
            transit_mount: crate::DEFAULT_TRANSIT_MOUNT.to_string(),
            timeout_ms: crate::DEFAULT_TIMEOUT_MS,
            user_agent_suffix: None,
            ca_cert_pem: None,
            telemetry_config: TelemetryConfig::default(),
            allow_insecure_http: false,
        }
    }

    /// Create a builder from the standard `VAULT_*` environment variables
    ///
    /// Reads `VAULT_ADDR` (required), `VAULT_TOKEN`, `VAULT_NAMESPACE`,
    /// `VAULT_KV_VERSION`, `VAULT_TRANSIT_MOUNT`, `VAULT_CACERT` (path to a
    /// PEM file) and `VAULT_CLIENT_TIMEOUT` (milliseconds).
    pub fn from_env() -> Result<Self> {
        let vars: HashMap<String, String> = std::env::vars()
            .filter(|(name, _)| name.starts_with("VAULT_"))
            .collect();
        let get = |name: &str| vars.get(name).filter(|v| !v.trim().is_empty());

        let address = get("VAULT_ADDR")
            .ok_or_else(|| Error::Config("VAULT_ADDR is not set".to_string()))?;
        let mut builder = Self::new(address.trim());

        if let Some(token) = get("VAULT_TOKEN") {
            builder = builder.auth(Auth::token(token.trim()));
        }
        if let Some(namespace) = get("VAULT_NAMESPACE") {
            builder = builder.namespace(namespace.trim());
        }
        if let Some(version) = get("VAULT_KV_VERSION") {
            builder = builder.kv_backend(KeyValueBackend::parse(version)?);
        }
        if let Some(mount) = get("VAULT_TRANSIT_MOUNT") {
            builder = builder.transit_mount(mount.trim());
        }
        if let Some(path) = get("VAULT_CACERT") {
            builder = builder.ca_cert_pem(read_pem(path.trim())?);
        }
        if let Some(timeout) = get("VAULT_CLIENT_TIMEOUT") {
            builder = builder.timeout_ms(parse_millis("VAULT_CLIENT_TIMEOUT", timeout)?);
        }

        Ok(builder)
    }

    /// Create a builder from `vault.*` properties
    ///
    /// Recognized keys: `vault.uri` (required), `vault.token`,
    /// `vault.namespace`, `vault.kv.version`, `vault.transit.path`,
    /// `vault.read.timeout` (milliseconds) and `vault.ssl.trust-store-pem`
    /// (path to a PEM file). Other keys are ignored.
    pub fn from_properties(properties: &HashMap<String, String>) -> Result<Self> {
        let get = |name: &str| properties.get(name).filter(|v| !v.trim().is_empty());

        let address = get("vault.uri")
            .ok_or_else(|| Error::Config("vault.uri must be specified".to_string()))?;
        let mut builder = Self::new(address.trim());

        if let Some(token) = get("vault.token") {
            builder = builder.auth(Auth::token(token.trim()));
        }
        if let Some(namespace) = get("vault.namespace") {
            builder = builder.namespace(namespace.trim());
        }
        if let Some(version) = get("vault.kv.version") {
            builder = builder.kv_backend(KeyValueBackend::parse(version)?);
        }
        if let Some(mount) = get("vault.transit.path") {
            builder = builder.transit_mount(mount.trim());
        }
        if let Some(timeout) = get("vault.read.timeout") {
            builder = builder.timeout_ms(parse_millis("vault.read.timeout", timeout)?);
        }
        if let Some(path) = get("vault.ssl.trust-store-pem") {
            builder = builder.ca_cert_pem(read_pem(path.trim())?);
        }

        Ok(builder)
    }

    /// Set the authentication method
    pub fn auth(mut self, auth: Auth) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Set the Vault Enterprise namespace
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Set the key/value engine version (default: V2)
    pub fn kv_backend(mut self, backend: KeyValueBackend) -> Self {
        self.kv_backend = backend;
        self
    }

    /// Set the transit engine mount path (default: `transit`)
    pub fn transit_mount(mut self, mount: impl Into<String>) -> Self {
        self.transit_mount = mount.into();
        self
    }

    /// Set the request timeout in milliseconds
    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Add a custom user agent suffix
    pub fn user_agent_extra(mut self, suffix: impl Into<String>) -> Self {
        self.user_agent_suffix = Some(suffix.into());
        self
    }

    /// Trust an additional root certificate, PEM encoded
    pub fn ca_cert_pem(mut self, pem: impl Into<Vec<u8>>) -> Self {
        self.ca_cert_pem = Some(pem.into());
        self
    }

    /// Configure telemetry/metrics
    #[cfg(feature = "metrics")]
    pub fn with_telemetry(mut self, config: TelemetryConfig) -> Self {
        self.telemetry_config = config;
        self
    }

    /// Enable telemetry with default settings
    #[cfg(feature = "metrics")]
    pub fn enable_telemetry(mut self) -> Self {
        self.telemetry_config.enabled = true;
        self
    }

    /// Allow insecure HTTP connections to any host (requires danger-insecure-http feature)
    #[cfg(feature = "danger-insecure-http")]
    pub fn allow_insecure_http(mut self) -> Self {
        self.allow_insecure_http = true;
        self
    }

    /// Build the service with the HTTP transport
    ///
    /// # Errors
    ///
    /// * `Error::Config` for an invalid address, missing auth or bad CA certificate
    /// * `Error::UnsupportedBackend` when the K/V backend is not version 2
    pub fn build(self) -> Result<crate::VaultService> {
        crate::service::VaultService::new(self.into_config()?)
    }

    /// Build the service on top of a custom [`Transport`]
    pub fn build_with_transport(self, transport: Arc<dyn Transport>) -> Result<crate::VaultService> {
        crate::service::VaultService::with_transport(self.into_config()?, transport)
    }

    /// Validate the options and produce a [`ClientConfig`]
    pub fn into_config(self) -> Result<ClientConfig> {
        let address = self.address.trim().trim_end_matches('/');

        let url = reqwest::Url::parse(address)
            .map_err(|e| Error::Config(format!("Invalid Vault address {}: {}", address, e)))?;
        if !url.username().is_empty() || url.password().is_some() {
            return Err(Error::Config(
                "Vault address must not contain credentials. Use .auth() to set a Vault token".to_string(),
            ));
        }

        match url.scheme() {
            "https" => {}
            "http" if self.allow_insecure_http || is_loopback(&url) => {}
            "http" => {
                #[cfg(feature = "danger-insecure-http")]
                return Err(Error::Config(
                    "HTTP URLs are only allowed for loopback hosts. Use .allow_insecure_http() to enable (dangerous!)".to_string()
                ));

                #[cfg(not(feature = "danger-insecure-http"))]
                return Err(Error::Config(
                    "HTTP URLs are only allowed for loopback hosts. Enable the 'danger-insecure-http' feature and use .allow_insecure_http() (dangerous!)".to_string()
                ));
            }
            _ => {
                return Err(Error::Config("Vault address must start with http:// or https://".to_string()));
            }
        }

        // Require authentication
        let auth = self.auth.ok_or_else(|| {
            Error::Config("Authentication is required. Use .auth() to set a Vault token".to_string())
        })?;

        let transit_mount = crate::util::trim_path(&self.transit_mount).to_string();
        if transit_mount.is_empty() {
            return Err(Error::Config("Transit mount must not be empty".to_string()));
        }
        crate::kv::check_segments("Transit mount", &transit_mount)
            .map_err(|_| Error::Config("Transit mount must not contain '.' or '..' segments".to_string()))?;

        Ok(ClientConfig {
            address: address.to_string(),
            auth,
            namespace: self.namespace.filter(|ns| !ns.trim().is_empty()),
            kv_backend: self.kv_backend,
            transit_mount,
            timeout: Duration::from_millis(self.timeout_ms),
            user_agent_suffix: self.user_agent_suffix,
            ca_cert_pem: self.ca_cert_pem,
            telemetry_config: self.telemetry_config,
            allow_insecure_http: self.allow_insecure_http,
        })
    }
}

/// Whether the parsed host is `localhost` or a loopback IP
fn is_loopback(url: &reqwest::Url) -> bool {
    match url.host_str() {
        Some("localhost") => true,
        Some(host) => host
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<std::net::IpAddr>()
            .map(|ip| ip.is_loopback())
            .unwrap_or(false),
        None => false,
    }
}

fn parse_millis(name: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{} must be a number of milliseconds", name)))
}

fn read_pem(path: &str) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| Error::Config(format!("Failed to read CA certificate {}: {}", path, e)))
}
