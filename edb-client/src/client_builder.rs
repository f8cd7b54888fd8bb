//! Client builder and configuration
//!
//! The `ClientBuilder` provides a fluent API for configuring a client before
//! it is started. It allows you to:
//! - Pick the endpoint and whether to use TLS
//! - Bound connection setup and individual calls with timeouts
//! - Change the remote method prefix
//! - Configure observability (OpenTelemetry)
//!
//! # Examples
//!
//! ```rust,no_run
//! use edb_client::ClientBuilder;
//! use std::time::Duration;
//!
//! # async fn example() -> edb_core::Result<()> {
//! let client = ClientBuilder::new("ws://localhost:1337/socketrpc")
//!     .request_timeout(Duration::from_secs(30))
//!     .build()?;
//! client.start().await?;
//!
//! // With observability
//! let monitored = ClientBuilder::new("localhost:1337/socketrpc")
//!     .secure(true)
//!     .with_default_observability()
//!     .service_name("node-monitor")
//!     .build()?;
//! # Ok(())
//! # }
//! ```

use crate::endpoint::Endpoint;
use crate::metrics::ClientMetrics;
use crate::Client;
use edb_core::{ObservabilityConfig, Result};
use std::sync::Arc;
use std::time::Duration;

/// Default remote method prefix
pub const DEFAULT_METHOD_PREFIX: &str = "erisdb";

/// Default bound on the WebSocket handshake
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Resolved client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Node endpoint
    pub endpoint: Endpoint,
    /// Per-call deadline; `None` waits until the connection ends
    pub request_timeout: Option<Duration>,
    /// Bound on connection setup
    pub connect_timeout: Duration,
    /// Prefix joined to namespace method names with a dot
    pub method_prefix: String,
}

impl ClientConfig {
    /// Fully-qualified remote method name for `method`
    ///
    /// ```rust
    /// # use edb_client::ClientBuilder;
    /// let client = ClientBuilder::new("ws://localhost:1337").build().unwrap();
    /// assert_eq!(client.config().method_name("getAccount"), "erisdb.getAccount");
    /// ```
    pub fn method_name(&self, method: &str) -> String {
        if self.method_prefix.is_empty() {
            method.to_string()
        } else {
            format!("{}.{}", self.method_prefix, method)
        }
    }
}

/// Builder for configuring and creating a [`Client`]
pub struct ClientBuilder {
    url: String,
    secure: bool,
    request_timeout: Option<Duration>,
    connect_timeout: Duration,
    method_prefix: String,
    observability_config: Option<ObservabilityConfig>,
    service_name: Option<String>,
}

impl ClientBuilder {
    /// Create a new client builder
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            secure: false,
            request_timeout: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            method_prefix: DEFAULT_METHOD_PREFIX.to_string(),
            observability_config: None,
            service_name: None,
        }
    }

    /// Use TLS when the URL carries no scheme
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Fail calls that get no response within `timeout`
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Bound the WebSocket handshake
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Replace the remote method prefix; empty sends bare method names
    pub fn method_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.method_prefix = prefix.into();
        self
    }

    /// Enable OpenTelemetry observability with custom configuration
    pub fn with_observability(mut self, config: ObservabilityConfig) -> Self {
        self.observability_config = Some(config);
        self
    }

    /// Enable OpenTelemetry observability with default configuration
    pub fn with_default_observability(mut self) -> Self {
        self.observability_config = Some(ObservabilityConfig::default());
        self
    }

    /// Set service name for observability (used if observability is enabled)
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Resolve the endpoint and create an idle client
    ///
    /// The client does not connect until [`Client::start`] is called.
    pub fn build(self) -> Result<Client> {
        let endpoint = Endpoint::parse(&self.url, self.secure)?;

        let metrics = match self.observability_config {
            Some(mut config) => {
                if let Some(name) = self.service_name {
                    config.service_name = name;
                }

                // An application may already own the global subscriber
                if let Err(e) = edb_core::init_observability(config.clone()) {
                    tracing::warn!(error = %e, "Observability not initialized, recording metrics only");
                }

                Some(Arc::new(ClientMetrics::new(config.service_name)))
            }
            None => None,
        };

        let config = ClientConfig {
            endpoint,
            request_timeout: self.request_timeout,
            connect_timeout: self.connect_timeout,
            method_prefix: self.method_prefix,
        };

        tracing::debug!(url = %config.endpoint, "Client created");
        Ok(Client::new(config, metrics))
    }
}
