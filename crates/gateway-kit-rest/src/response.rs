//! Turns gRPC results into HTTP responses.
//!
//! The gRPC service records the HTTP code it wants in `x-http-code`
//! metadata. Successful calls keep their JSON body and take that code;
//! failed calls take it too, falling back to the canonical mapping of the
//! gRPC status.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use gateway_kit_grpc::HTTP_CODE_METADATA;
use serde::Serialize;
use tonic::metadata::MetadataMap;
use tonic::Status;

use crate::error::ErrorResponse;
use crate::status_map::{grpc_code_name, grpc_to_http_status};

/// Build the HTTP response for a gRPC call result.
///
/// ```ignore
/// async fn versions(State(client): State<ComponentsClient<Channel>>, Json(req): Json<ComponentRequest>) -> Response {
///     forward_response(client.clone().get_component_versions(req).await)
/// }
/// ```
pub fn forward_response<T: Serialize>(result: Result<tonic::Response<T>, Status>) -> Response {
    match result {
        Ok(response) => {
            let status = http_code(response.metadata()).unwrap_or(StatusCode::OK);
            (status, axum::Json(response.into_inner())).into_response()
        }
        Err(status) => forward_error(&status),
    }
}

fn forward_error(status: &Status) -> Response {
    let http_status =
        http_code(status.metadata()).unwrap_or_else(|| grpc_to_http_status(status.code()));
    tracing::debug!(
        grpc_code = grpc_code_name(status.code()),
        http_status = http_status.as_u16(),
        grpc_message = status.message(),
        "Forwarding gRPC error"
    );
    ErrorResponse::new(grpc_code_name(status.code()), status.message())
        .into_response_with(http_status)
}

/// HTTP status recorded in `x-http-code`, if present and valid.
pub fn http_code(metadata: &MetadataMap) -> Option<StatusCode> {
    let value = metadata.get(HTTP_CODE_METADATA)?;
    let parsed = value
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse::<u16>().ok())
        .and_then(|code| StatusCode::from_u16(code).ok());

    if parsed.is_none() {
        tracing::debug!(value = ?value, "Ignoring unparseable x-http-code");
    }
    parsed
}

/// Handler return type that forwards a gRPC result.
///
/// ```ignore
/// async fn versions(State(client): State<ComponentsClient<Channel>>, Json(req): Json<ComponentRequest>) -> Forward<ComponentVersionsResponse> {
///     Forward(client.clone().get_component_versions(req).await)
/// }
/// ```
pub struct Forward<T>(pub Result<tonic::Response<T>, Status>);

impl<T: Serialize> IntoResponse for Forward<T> {
    fn into_response(self) -> Response {
        forward_response(self.0)
    }
}
