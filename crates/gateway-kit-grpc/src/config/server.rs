//! gRPC server configuration.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

use gateway_kit::{ConfigBuilder, Environment, IpFilterConfig, TlsConfig};
use tonic::transport::{Identity, ServerTlsConfig};

use crate::error::Error;

/// gRPC server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GrpcServerConfig {
    pub environment: Environment,
    pub host: String,
    pub port: u16,
    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Maximum concurrent streams per connection.
    pub max_concurrent_streams: Option<u32>,
    /// TCP keepalive interval in seconds.
    pub tcp_keepalive_secs: Option<u64>,
    pub tcp_nodelay: bool,
    pub tls: TlsConfig,
    pub ip_filter: IpFilterConfig,
}

impl Default for GrpcServerConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            host: "0.0.0.0".to_string(),
            port: 50051,
            request_timeout_secs: 30,
            max_concurrent_streams: None,
            tcp_keepalive_secs: Some(60),
            tcp_nodelay: true,
            tls: TlsConfig::default(),
            ip_filter: IpFilterConfig::default(),
        }
    }
}

impl GrpcServerConfig {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        self.addr().parse()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn tcp_keepalive(&self) -> Option<Duration> {
        self.tcp_keepalive_secs.map(Duration::from_secs)
    }

    /// Validate the TLS files. `Ok(false)` when TLS is not configured.
    pub fn is_tls_enabled(&self) -> Result<bool, Error> {
        Ok(self.tls.is_enabled()?)
    }

    /// Build the server TLS settings, or `None` when TLS is off.
    pub fn tls_config(&self) -> Result<Option<ServerTlsConfig>, Error> {
        if !self.is_tls_enabled()? {
            return Ok(None);
        }
        let cert = std::fs::read(&self.tls.cert_path).map_err(|e| {
            tracing::error!(file = %self.tls.cert_path, error = %e, "Problem loading TLS file");
            Error::tls(e)
        })?;
        let key = std::fs::read(&self.tls.key_path).map_err(|e| {
            tracing::error!(file = %self.tls.key_path, error = %e, "Problem loading TLS file");
            Error::tls(e)
        })?;
        Ok(Some(
            ServerTlsConfig::new().identity(Identity::from_pem(cert, key)),
        ))
    }
}

impl AsRef<GrpcServerConfig> for GrpcServerConfig {
    fn as_ref(&self) -> &GrpcServerConfig {
        self
    }
}
