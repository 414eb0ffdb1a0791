mod json_error;
mod trace;

use axum::http::StatusCode;
use axum::Router;
use gateway_kit::IpFilterLayer;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;

use crate::routes::fallback_handler;
use crate::Gateway;

pub use json_error::{JsonErrorLayer, JsonErrorService};
pub use trace::{GatewayTraceLayer, RequestSpan};

/// Applies the gateway middleware stack to a router.
pub(crate) fn default_layers(router: Router, gateway: &Gateway) -> Router {
    let config = gateway.config();

    // The last layer added is outermost. JsonErrorLayer goes last so it sees
    // timeouts, panics and IP filter rejections.
    router
        .fallback(fallback_handler)
        .layer(CatchPanicLayer::new())
        .layer(IpFilterLayer::from_option(gateway.ip_filter().cloned()))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(GatewayTraceLayer::new())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.request_timeout(),
        ))
        .layer(JsonErrorLayer::new(config.environment))
}
