//! Service errors that carry the HTTP status the REST gateway should return.

use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt;

use http::StatusCode;
use serde_json::Value;

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Values for [`ResponseError::internal_code`].
pub mod codes {
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
    pub const SERVICE_UNAVAILABLE: &str = "SERVICE_UNAVAILABLE";
}

/// A classified service error.
///
/// Business logic returns these (directly, boxed, or wrapped in
/// `anyhow::Error` with extra context) and the response interceptor turns
/// them into a failed `StatusResponse` plus an `x-http-code` hint.
///
/// ```ignore
/// use gateway_kit_grpc::ResponseError;
///
/// fn lookup(purl: &str) -> anyhow::Result<Component> {
///     if purl.is_empty() {
///         return Err(ResponseError::bad_request("purl is required").into());
///     }
///     repo.find(purl)
///         .map_err(|e| ResponseError::service_unavailable("database unavailable").with_source(e))?
///         .ok_or_else(|| ResponseError::not_found("component").into())
/// }
/// ```
#[derive(Debug)]
pub struct ResponseError {
    message: String,
    http_code: u16,
    internal_code: String,
    source: Option<BoxError>,
    details: BTreeMap<String, Value>,
}

impl ResponseError {
    /// Build an error with an arbitrary HTTP code. `0` means "use the
    /// default" and resolves to 500.
    pub fn new(message: impl Into<String>, http_code: u16, internal_code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            http_code,
            internal_code: internal_code.into(),
            source: None,
            details: BTreeMap::new(),
        }
    }

    /// Missing required fields, malformed input, invalid parameters.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::BAD_REQUEST.as_u16(), codes::BAD_REQUEST)
    }

    /// The named resource does not exist.
    ///
    /// A not-found error never carries a cause: [`with_source`](Self::with_source)
    /// leaves it unchanged.
    pub fn not_found(resource: impl fmt::Display) -> Self {
        Self::new(
            format!("{resource} not found"),
            StatusCode::NOT_FOUND.as_u16(),
            codes::NOT_FOUND,
        )
    }

    /// Unexpected failures.
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(
            message,
            StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            codes::INTERNAL_ERROR,
        )
    }

    /// A dependency (database, upstream service) is down or timing out.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(
            message,
            StatusCode::SERVICE_UNAVAILABLE.as_u16(),
            codes::SERVICE_UNAVAILABLE,
        )
    }

    /// Attach the underlying cause. Ignored for `NOT_FOUND` errors.
    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        if self.internal_code != codes::NOT_FOUND {
            self.source = Some(source.into());
        }
        self
    }

    /// Add structured context for the error log.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The code as given, including the `0` sentinel.
    pub fn raw_http_code(&self) -> u16 {
        self.http_code
    }

    /// The HTTP status to report. `0` and values outside 100..=999 become 500.
    pub fn http_code(&self) -> StatusCode {
        StatusCode::from_u16(self.http_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn internal_code(&self) -> &str {
        &self.internal_code
    }

    pub fn details(&self) -> &BTreeMap<String, Value> {
        &self.details
    }
}

impl fmt::Display for ResponseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{}: {}", self.message, source),
            None => f.write_str(&self.message),
        }
    }
}

impl StdError for ResponseError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn StdError + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_code_and_category() {
        let cases = [
            (ResponseError::bad_request("bad purl"), 400, codes::BAD_REQUEST, "bad purl"),
            (ResponseError::not_found("component"), 404, codes::NOT_FOUND, "component not found"),
            (ResponseError::internal_error("boom"), 500, codes::INTERNAL_ERROR, "boom"),
            (
                ResponseError::service_unavailable("db down"),
                503,
                codes::SERVICE_UNAVAILABLE,
                "db down",
            ),
        ];

        for (err, code, internal, message) in cases {
            assert_eq!(err.http_code().as_u16(), code);
            assert_eq!(err.internal_code(), internal);
            assert_eq!(err.message(), message);
            assert!(err.source().is_none());
        }
    }

    #[test]
    fn not_found_with_empty_resource() {
        assert_eq!(ResponseError::not_found("").message(), " not found");
    }

    #[test]
    fn zero_code_resolves_to_500() {
        let err = ResponseError::new("x", 0, "");
        assert_eq!(err.raw_http_code(), 0);
        assert_eq!(err.http_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn out_of_range_code_resolves_to_500() {
        assert_eq!(
            ResponseError::new("x", 42, "").http_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ResponseError::new("x", 1000, "").http_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn display_includes_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "connection timed out");
        let err = ResponseError::service_unavailable("database unavailable").with_source(io);

        assert_eq!(err.to_string(), "database unavailable: connection timed out");
        assert_eq!(err.message(), "database unavailable");
        assert_eq!(err.source().unwrap().to_string(), "connection timed out");
    }

    #[test]
    fn not_found_drops_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no rows");
        let err = ResponseError::not_found("x").with_source(io);

        assert!(err.source().is_none());
        assert_eq!(err.to_string(), "x not found");
        assert_eq!(err.http_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn details_are_kept_in_order() {
        let err = ResponseError::bad_request("invalid purl")
            .with_detail("purl", "pkg:npm/")
            .with_detail("attempt", 2);

        let keys: Vec<_> = err.details().keys().cloned().collect();
        assert_eq!(keys, ["attempt", "purl"]);
        assert_eq!(err.details()["attempt"], Value::from(2));
    }
}
