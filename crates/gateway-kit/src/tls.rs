//! TLS file settings shared by the gRPC server and the REST gateway.

use serde::{Deserialize, Serialize};

use crate::files::{check_tls, FileError};

/// Host name the gateway verifies when it dials the local gRPC server.
pub const DEFAULT_SERVER_NAME: &str = "localhost";

/// TLS certificate and key locations (PEM).
///
/// TLS is on only when both paths are set and both files are readable.
/// `common_name` overrides the name checked against the certificate when
/// the gateway connects to the gRPC server over `localhost`; use it when the
/// certificate does not list `localhost` in its SAN entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TlsConfig {
    pub cert_path: String,
    pub key_path: String,
    pub common_name: Option<String>,
}

impl TlsConfig {
    pub fn new(cert_path: impl Into<String>, key_path: impl Into<String>) -> Self {
        Self {
            cert_path: cert_path.into(),
            key_path: key_path.into(),
            common_name: None,
        }
    }

    pub fn with_common_name(mut self, common_name: impl Into<String>) -> Self {
        self.common_name = Some(common_name.into());
        self
    }

    /// Validate the configured files and report whether TLS is on.
    pub fn is_enabled(&self) -> Result<bool, FileError> {
        check_tls(&self.cert_path, &self.key_path)
    }

    /// Name to verify the server certificate against.
    pub fn server_name(&self) -> &str {
        self.common_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_SERVER_NAME)
    }
}
