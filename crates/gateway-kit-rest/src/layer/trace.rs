use axum::http::Request;
use gateway_kit_grpc::REQUEST_ID_HEADER;
use tower::Layer;
use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    trace::{DefaultOnResponse, MakeSpan, TraceLayer},
    LatencyUnit,
};
use tracing::{Level, Span};

/// Span per gateway request with method, path and request id.
#[derive(Clone, Copy)]
pub struct RequestSpan;

impl<B> MakeSpan<B> for RequestSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        let request_id = request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");

        tracing::info_span!(
            "rest",
            method = %request.method(),
            path = %request.uri().path(),
            request_id = %request_id,
        )
    }
}

pub type InnerTraceLayer =
    TraceLayer<SharedClassifier<ServerErrorsAsFailures>, RequestSpan, (), DefaultOnResponse>;

/// `tower-http` trace layer logging each response at INFO with latency in
/// milliseconds.
#[derive(Clone, Copy, Default)]
pub struct GatewayTraceLayer;

impl GatewayTraceLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for GatewayTraceLayer {
    type Service = <InnerTraceLayer as Layer<S>>::Service;

    fn layer(&self, inner: S) -> Self::Service {
        TraceLayer::new_for_http()
            .make_span_with(RequestSpan)
            .on_request(())
            .on_response(
                DefaultOnResponse::new()
                    .level(Level::INFO)
                    .latency_unit(LatencyUnit::Millis),
            )
            .layer(inner)
    }
}
