use axum::http::StatusCode;
use axum::response::Response;

use crate::error::ErrorResponse;

/// JSON 404 for paths no gateway route matches.
pub async fn fallback_handler() -> Response {
    ErrorResponse::from_status(StatusCode::NOT_FOUND, "The requested resource was not found")
        .into_response_with(StatusCode::NOT_FOUND)
}
