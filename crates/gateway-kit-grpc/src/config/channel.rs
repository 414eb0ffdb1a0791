//! gRPC client channel configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use gateway_kit::{ConfigBuilder, ConfigError};
use tonic::transport::{Certificate, ClientTlsConfig};

use crate::error::Error;

/// Configuration for gRPC client channels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Service endpoint URL.
    pub endpoint: String,
    pub connect_timeout_secs: u64,
    pub timeout_secs: u64,
    pub tcp_keepalive_secs: Option<u64>,
    pub tcp_nodelay: bool,
    pub http2_keepalive_interval_secs: Option<u64>,
    pub http2_keepalive_timeout_secs: Option<u64>,
    /// CA certificate used to verify the server (PEM). TLS is off when unset.
    pub tls_ca_path: Option<String>,
    /// Name checked against the server certificate instead of the endpoint host.
    pub tls_domain: Option<String>,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:50051".to_string(),
            connect_timeout_secs: 10,
            timeout_secs: 30,
            tcp_keepalive_secs: Some(60),
            tcp_nodelay: true,
            http2_keepalive_interval_secs: Some(30),
            http2_keepalive_timeout_secs: Some(20),
            tls_ca_path: None,
            tls_domain: None,
        }
    }
}

impl ChannelConfig {
    pub fn builder() -> ChannelConfigBuilder {
        ChannelConfigBuilder::new()
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn tcp_keepalive(&self) -> Option<Duration> {
        self.tcp_keepalive_secs.map(Duration::from_secs)
    }

    pub fn http2_keepalive_interval(&self) -> Option<Duration> {
        self.http2_keepalive_interval_secs.map(Duration::from_secs)
    }

    pub fn http2_keepalive_timeout(&self) -> Option<Duration> {
        self.http2_keepalive_timeout_secs.map(Duration::from_secs)
    }

    pub fn is_tls_enabled(&self) -> bool {
        self.tls_ca_path.as_deref().is_some_and(|path| !path.is_empty())
    }

    /// Build the client TLS settings, or `None` when no CA is configured.
    pub fn tls_config(&self) -> Result<Option<ClientTlsConfig>, Error> {
        let Some(ca_path) = self.tls_ca_path.as_deref().filter(|path| !path.is_empty()) else {
            return Ok(None);
        };
        let pem = std::fs::read(ca_path).map_err(|e| {
            tracing::error!(file = %ca_path, error = %e, "Problem loading TLS file");
            Error::tls(e)
        })?;

        let mut tls = ClientTlsConfig::new().ca_certificate(Certificate::from_pem(pem));
        if let Some(domain) = &self.tls_domain {
            tls = tls.domain_name(domain);
        }
        Ok(Some(tls))
    }
}

/// Builder for [`ChannelConfig`] with programmatic overrides on top of
/// file and environment settings.
#[derive(Default)]
pub struct ChannelConfigBuilder {
    inner: ConfigBuilder,
    endpoint: Option<String>,
    timeout_secs: Option<u64>,
    connect_timeout_secs: Option<u64>,
    tls_ca_path: Option<String>,
    tls_domain: Option<String>,
}

impl ChannelConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dotenv(mut self) -> Self {
        self.inner = self.inner.with_dotenv();
        self
    }

    pub fn with_config_file(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.inner = self.inner.with_config_file(path);
        self
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn connect_timeout_secs(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = Some(secs);
        self
    }

    /// Verify the server with this CA certificate, checking `domain`.
    pub fn tls(mut self, ca_path: impl Into<String>, domain: impl Into<String>) -> Self {
        self.tls_ca_path = Some(ca_path.into());
        self.tls_domain = Some(domain.into());
        self
    }

    pub fn build(self) -> Result<ChannelConfig, ConfigError> {
        let mut config: ChannelConfig = self.inner.build()?;

        if let Some(endpoint) = self.endpoint {
            config.endpoint = endpoint;
        }
        if let Some(timeout) = self.timeout_secs {
            config.timeout_secs = timeout;
        }
        if let Some(connect_timeout) = self.connect_timeout_secs {
            config.connect_timeout_secs = connect_timeout;
        }
        if self.tls_ca_path.is_some() {
            config.tls_ca_path = self.tls_ca_path;
            config.tls_domain = self.tls_domain;
        }

        Ok(config)
    }
}
