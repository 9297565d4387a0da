//! HTTP transport built on `reqwest`
//!
//! Attaches the credential from the configured [`Auth`](crate::Auth) to every
//! request, along with the namespace and request ID headers. Each call is a
//! single round trip: failures are reported immediately and never retried.

use crate::{
    config::ClientConfig,
    endpoints::Endpoints,
    errors::{Error, Result},
    telemetry::{self, Metrics},
    transport::{Operation, Transport, VaultRequest, VaultResponse},
    util::{generate_request_id, header_str},
};
use async_trait::async_trait;
use reqwest::{Client as HttpClient, Method};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};

const USER_AGENT_PREFIX: &str = "vault-versioned-sdk-rust";

/// Header carrying the Vault Enterprise namespace
const NAMESPACE_HEADER: &str = "X-Vault-Namespace";

/// [`Transport`] talking to Vault over HTTPS
#[derive(Clone)]
pub struct HttpTransport {
    config: ClientConfig,
    http: HttpClient,
    endpoints: Endpoints,
    metrics: Option<Arc<Metrics>>,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("address", &self.config.address)
            .field("namespace", &self.config.namespace)
            .field("timeout", &self.config.timeout)
            .finish()
    }
}

impl HttpTransport {
    /// Create a transport for the given configuration
    pub fn new(config: ClientConfig) -> Result<Self> {
        // Build user agent
        let user_agent = if let Some(suffix) = &config.user_agent_suffix {
            format!("{}/{} {}", USER_AGENT_PREFIX, crate::VERSION, suffix)
        } else {
            format!("{}/{}", USER_AGENT_PREFIX, crate::VERSION)
        };

        let mut http_builder = HttpClient::builder()
            .user_agent(user_agent)
            .timeout(config.timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10);

        // Plain HTTP only passes config validation for loopback hosts or
        // with the danger-insecure-http opt-in
        if config.address.starts_with("https://") {
            http_builder = http_builder.https_only(true);
        }

        if let Some(pem) = &config.ca_cert_pem {
            let certificate = reqwest::Certificate::from_pem(pem)
                .map_err(|e| Error::Config(format!("Invalid CA certificate: {}", e)))?;
            http_builder = http_builder.add_root_certificate(certificate);
        }

        let http = http_builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        let metrics = if config.telemetry_config.enabled {
            Some(telemetry::init_telemetry(config.telemetry_config.clone()))
        } else {
            None
        };

        Ok(Self {
            endpoints: Endpoints::new(&config.address),
            http,
            metrics,
            config,
        })
    }

    /// Build a request with common headers
    async fn build_request(
        &self,
        request: &VaultRequest,
        request_id: &str,
    ) -> Result<reqwest::RequestBuilder> {
        let url = self.endpoints.url(&request.path);
        let method = match request.operation {
            Operation::Read | Operation::List => Method::GET,
            Operation::Write => Method::POST,
        };

        let mut builder = self
            .http
            .request(method, &url)
            .header("X-Request-ID", request_id)
            .header(reqwest::header::ACCEPT, "application/json");

        // Current credential from the session
        let (auth_header, auth_value) = self
            .config
            .auth
            .get_header()
            .await
            .map_err(|e| Error::Config(format!("Failed to get auth header: {}", e)))?;
        builder = builder.header(auth_header, auth_value);

        if let Some(namespace) = &self.config.namespace {
            builder = builder.header(NAMESPACE_HEADER, namespace);
        }

        let mut query = request.query.clone();
        if request.operation == Operation::List {
            query.push(("list".to_string(), "true".to_string()));
        }
        if !query.is_empty() {
            builder = builder.query(&query);
        }

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        Ok(builder)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: VaultRequest) -> Result<VaultResponse> {
        let request_id = generate_request_id();
        let operation = request.operation.as_str();
        let builder = self.build_request(&request, &request_id).await?;

        trace!("{} {} (req={})", operation, request.path, request_id);
        let start_time = std::time::Instant::now();

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Request to {} failed: {}", request.path, e);
                if let Some(metrics) = &self.metrics {
                    metrics.record_transport_error(operation);
                }
                return Err(Error::from(e));
            }
        };

        let status = response.status().as_u16();
        if let Some(metrics) = &self.metrics {
            metrics.record_request(operation, status, start_time.elapsed().as_secs_f64());
        }
        let request_id = header_str(response.headers(), "x-request-id").or(Some(request_id));

        let bytes = response.bytes().await.map_err(Error::from)?;
        let body: Option<serde_json::Value> = if bytes.is_empty() {
            None
        } else {
            // Error pages from proxies in front of Vault are not JSON
            match serde_json::from_slice(&bytes) {
                Ok(body) => Some(body),
                Err(e) if (200..300).contains(&status) => return Err(Error::from(e)),
                Err(_) => None,
            }
        };

        debug!("{} {} -> {}", operation, request.path, status);
        Ok(VaultResponse {
            status,
            body,
            request_id,
        })
    }
}
