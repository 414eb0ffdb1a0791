//! Tracing layer for gRPC requests.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use tower::{Layer, Service};
use tracing::Instrument;

use super::{HTTP_CODE_METADATA, REQUEST_ID_HEADER};

/// Opens a span per call with `method` and `request_id`, so events logged by
/// handlers and the response interceptor are tied to the request. Logs one
/// line on completion with the gRPC status, the gateway HTTP code if one was
/// set, and the latency.
#[derive(Clone, Copy, Default)]
pub struct TraceLayer;

impl TraceLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for TraceLayer {
    type Service = TraceService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TraceService { inner }
    }
}

#[derive(Clone)]
pub struct TraceService<S> {
    inner: S,
}

impl<S, ReqBody, ResBody> Service<http::Request<ReqBody>> for TraceService<S>
where
    S: Service<http::Request<ReqBody>, Response = http::Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    ReqBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: http::Request<ReqBody>) -> Self::Future {
        let request_id = req
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");

        let span = tracing::info_span!(
            "grpc",
            method = %req.uri().path(),
            request_id = %request_id,
        );

        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(
            async move {
                let start = Instant::now();
                let result = inner.call(req).await;
                let latency_ms = start.elapsed().as_millis();

                match &result {
                    Ok(response) => {
                        let header = |name: &'static str| {
                            response
                                .headers()
                                .get(name)
                                .and_then(|v| v.to_str().ok())
                        };
                        let status = header("grpc-status").unwrap_or("0");
                        let http_code = header(HTTP_CODE_METADATA).unwrap_or("-");

                        tracing::info!(status = %status, http_code = %http_code, latency_ms = %latency_ms, "gRPC");
                    }
                    Err(_) => {
                        tracing::error!(latency_ms = %latency_ms, "gRPC error");
                    }
                }

                result
            }
            .instrument(span),
        )
    }
}
