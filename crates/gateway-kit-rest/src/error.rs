use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::io;

use gateway_kit::FileError;

/// Gateway setup and runtime errors.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error(transparent)]
    File(#[from] FileError),
    #[error("failed to load TLS credentials from file: {0}")]
    Tls(String),
    #[error("invalid gRPC target: {0}")]
    Channel(#[from] gateway_kit_grpc::Error),
    #[error("failed to bind to {addr}: {source}")]
    Bind { addr: String, source: io::Error },
    #[error("server error: {0}")]
    Runtime(#[source] io::Error),
}

impl GatewayError {
    pub fn tls(err: impl std::fmt::Display) -> Self {
        Self::Tls(err.to_string())
    }
}

/// JSON error body: `{"code": "NOT_FOUND", "message": "..."}`.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create an error response from a status code.
    pub fn from_status(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code: status_to_error_code(status),
            message: message.into(),
        }
    }

    pub fn into_response_with(self, status: StatusCode) -> Response {
        (status, axum::Json(self)).into_response()
    }
}

/// Convert a status code to an error code string (e.g., "NOT_FOUND").
pub(crate) fn status_to_error_code(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("ERROR")
        .to_uppercase()
        .replace(' ', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_to_error_code_common_codes() {
        assert_eq!(status_to_error_code(StatusCode::NOT_FOUND), "NOT_FOUND");
        assert_eq!(status_to_error_code(StatusCode::FORBIDDEN), "FORBIDDEN");
        assert_eq!(status_to_error_code(StatusCode::REQUEST_TIMEOUT), "REQUEST_TIMEOUT");
        assert_eq!(
            status_to_error_code(StatusCode::INTERNAL_SERVER_ERROR),
            "INTERNAL_SERVER_ERROR"
        );
    }

    #[test]
    fn error_response_from_status() {
        let resp = ErrorResponse::from_status(StatusCode::NOT_FOUND, "Resource not found");
        assert_eq!(resp, ErrorResponse::new("NOT_FOUND", "Resource not found"));
    }

    #[test]
    fn error_response_into_response() {
        let response = ErrorResponse::new("UNAVAILABLE", "backend down")
            .into_response_with(StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn gateway_error_display() {
        let err = GatewayError::tls("no such file");
        assert_eq!(
            err.to_string(),
            "failed to load TLS credentials from file: no such file"
        );

        let err = GatewayError::Bind {
            addr: "0.0.0.0:8080".to_string(),
            source: io::Error::new(io::ErrorKind::AddrInUse, "address in use"),
        };
        assert_eq!(err.to_string(), "failed to bind to 0.0.0.0:8080: address in use");
    }
}
