//! Gateway configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use gateway_kit::{ConfigBuilder, ConfigError, Environment, IpFilterConfig, TlsConfig};

/// REST gateway configuration.
///
/// `tls` holds the certificate the gateway serves with; the same certificate
/// is used as the CA when dialling the gRPC server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub environment: Environment,
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
    /// Port of the local gRPC server. A host part such as `0.0.0.0:50051`
    /// is accepted and ignored.
    pub grpc_port: String,
    pub tls: TlsConfig,
    pub ip_filter: IpFilterConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_secs: 10,
            grpc_port: "50051".to_string(),
            tls: TlsConfig::default(),
            ip_filter: IpFilterConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Create a new configuration builder.
    ///
    /// ```ignore
    /// let config: GatewayConfig = GatewayConfig::builder()
    ///     .with_dotenv()
    ///     .with_config_file("config.toml")
    ///     .build()?;
    /// ```
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Address the gateway dials: always `localhost`, whatever host
    /// `grpc_port` carries.
    pub fn grpc_target(&self) -> String {
        let port = match self.grpc_port.rfind(':') {
            Some(idx) => &self.grpc_port[idx + 1..],
            None => self.grpc_port.as_str(),
        };
        format!("localhost:{port}")
    }
}

impl AsRef<GatewayConfig> for GatewayConfig {
    fn as_ref(&self) -> &GatewayConfig {
        self
    }
}
