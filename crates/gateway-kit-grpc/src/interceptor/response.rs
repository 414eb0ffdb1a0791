//! Turns handler errors into a failed `StatusResponse` inside a successful
//! gRPC response, with the HTTP status for the gateway in `x-http-code`.

use std::future::Future;

use http::StatusCode;
use tonic::metadata::{Ascii, MetadataMap, MetadataValue};
use tonic::{Response, Status};

use crate::response_error::ResponseError;
use crate::status::{inject_status, StatusResponse, WithStatus};

/// Metadata key carrying the HTTP status the gateway should answer with.
pub const HTTP_CODE_METADATA: &str = "x-http-code";

/// Message returned for errors that are not a [`ResponseError`].
pub const UNHANDLED_MESSAGE: &str = "internal server error";

/// How an error will be reported to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub http_code: StatusCode,
    pub message: String,
    /// `None` for unclassified errors.
    pub internal_code: Option<String>,
}

/// Find the outermost [`ResponseError`] in the error chain.
pub fn find_response_error(error: &anyhow::Error) -> Option<&ResponseError> {
    error
        .chain()
        .find_map(|cause| cause.downcast_ref::<ResponseError>())
}

/// Decide the HTTP status and client message for `error`.
pub fn resolve(error: &anyhow::Error) -> Resolution {
    resolution_for(find_response_error(error))
}

fn resolution_for(response_error: Option<&ResponseError>) -> Resolution {
    match response_error {
        Some(response_error) => Resolution {
            http_code: response_error.http_code(),
            message: response_error.message().to_string(),
            internal_code: Some(response_error.internal_code().to_string()),
        },
        None => Resolution {
            http_code: StatusCode::INTERNAL_SERVER_ERROR,
            message: UNHANDLED_MESSAGE.to_string(),
            internal_code: None,
        },
    }
}

/// Log `error`, record its HTTP status in `metadata` and build the failed
/// status for the response body.
///
/// Unclassified errors are reported as `500` with a generic message; their
/// text only goes to the log.
pub fn handle(error: &anyhow::Error, metadata: &mut MetadataMap) -> StatusResponse {
    let response_error = find_response_error(error);
    let resolution = resolution_for(response_error);

    match resolution.http_code.as_u16().to_string().parse::<MetadataValue<Ascii>>() {
        Ok(value) => {
            metadata.insert(HTTP_CODE_METADATA, value);
        }
        Err(e) => {
            tracing::debug!(error = %e, "error setting x-http-code metadata");
        }
    }

    match response_error {
        Some(response_error) => {
            let details = serde_json::to_string(response_error.details()).unwrap_or_default();
            tracing::error!(
                error = %response_error,
                http_code = resolution.http_code.as_u16(),
                internal_code = %response_error.internal_code(),
                details = %details,
                "service error"
            );
        }
        None => {
            tracing::error!(error = %format_args!("{error:#}"), "unhandled error");
        }
    }

    StatusResponse::failed(resolution.message)
}

/// Convert a handler result into a tonic response.
///
/// Successful results pass through unchanged. Errors are swallowed: the
/// response is the default message with a failed status injected, so the
/// REST gateway renders the custom body instead of a gRPC error. The result
/// is always `Ok`.
pub fn response_interceptor<T, E>(result: Result<T, E>) -> Result<Response<T>, Status>
where
    T: Default + WithStatus,
    E: Into<anyhow::Error>,
{
    match result {
        Ok(message) => Ok(Response::new(message)),
        Err(error) => intercept_error(T::default(), error.into()),
    }
}

fn intercept_error<T: WithStatus>(message: T, error: anyhow::Error) -> Result<Response<T>, Status> {
    let mut response = Response::new(message);
    let status = handle(&error, response.metadata_mut());
    inject_status(Some(response.get_mut()), status);
    Ok(response)
}

/// Applies [`response_interceptor`] to tonic service methods.
///
/// ```ignore
/// #[tonic::async_trait]
/// impl Components for ComponentService {
///     async fn get_versions(
///         &self,
///         request: Request<VersionsRequest>,
///     ) -> Result<Response<VersionsResponse>, Status> {
///         ResponseInterceptor::new()
///             .wrap(self.versions(request.into_inner()))
///             .await
///     }
/// }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseInterceptor;

impl ResponseInterceptor {
    pub fn new() -> Self {
        Self
    }

    pub fn intercept<T, E>(&self, result: Result<T, E>) -> Result<Response<T>, Status>
    where
        T: Default + WithStatus,
        E: Into<anyhow::Error>,
    {
        response_interceptor(result)
    }

    /// For handlers that build part of the response before failing. On error
    /// only the status field of `message` is replaced.
    pub fn intercept_partial<T, E>(&self, message: T, error: Option<E>) -> Result<Response<T>, Status>
    where
        T: WithStatus,
        E: Into<anyhow::Error>,
    {
        match error {
            Some(error) => intercept_error(message, error.into()),
            None => Ok(Response::new(message)),
        }
    }

    /// Await a handler and intercept its result.
    pub async fn wrap<T, E, F>(&self, handler: F) -> Result<Response<T>, Status>
    where
        F: Future<Output = Result<T, E>>,
        T: Default + WithStatus,
        E: Into<anyhow::Error>,
    {
        self.intercept(handler.await)
    }
}
