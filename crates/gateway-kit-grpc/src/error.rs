//! Crate errors.

use gateway_kit::{ConfigError, FileError};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    File(#[from] FileError),
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("connection error: {0}")]
    Connection(#[from] tonic::transport::Error),
    #[error("TLS error: {0}")]
    Tls(String),
}

impl Error {
    pub fn tls(err: impl std::fmt::Display) -> Self {
        Self::Tls(err.to_string())
    }
}

/// Server startup and runtime errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("invalid address: {0}")]
    InvalidAddress(#[from] std::net::AddrParseError),
    #[error("failed to load server settings: {0}")]
    Setup(#[from] Error),
    #[error("transport error: {0}")]
    Transport(#[from] tonic::transport::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn error_display() {
        let err = Error::InvalidEndpoint("bad url".to_string());
        assert_eq!(err.to_string(), "invalid endpoint: bad url");

        let err = Error::tls("no certificates found");
        assert_eq!(err.to_string(), "TLS error: no certificates found");
    }

    #[test]
    fn file_errors_are_transparent() {
        let file_err = FileError::NotFound(PathBuf::from("/etc/ssl/server.crt"));
        let expected = file_err.to_string();
        assert_eq!(Error::from(file_err).to_string(), expected);
    }

    #[test]
    fn server_error_wraps_setup_failure() {
        let err = ServerError::from(Error::InvalidEndpoint("x".to_string()));
        assert!(err.to_string().starts_with("failed to load server settings"));
    }
}
