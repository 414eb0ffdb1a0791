//! Router extension traits.

use axum::Router;

use crate::error::GatewayError;
use crate::routes::fallback_handler;
use crate::Gateway;

/// Chainable gateway setup on an axum [`Router`].
///
/// ```rust,ignore
/// use axum::{routing::post, Router};
/// use gateway_kit_rest::{Gateway, GatewayConfig, RouterExt};
///
/// let gateway = Gateway::setup(config)?;
/// let client = ComponentsClient::new(gateway.connect_lazy()?);
///
/// Router::new()
///     .route("/v2/components/versions", post(versions))
///     .with_state(client)
///     .with_default_layers(&gateway)
///     .serve_with(&gateway)
///     .await?;
/// ```
pub trait RouterExt: Sized {
    /// Adds the JSON 404 fallback for unmatched routes.
    fn with_fallback(self) -> Self;

    /// Applies the gateway middleware stack, outermost first:
    /// - `JsonErrorLayer` - non-JSON error responses become `{code, message}`
    /// - `TimeoutLayer` - `408` after `request_timeout_secs`
    /// - `SetRequestIdLayer` - generates `x-request-id`
    /// - `GatewayTraceLayer` - request span and completion line
    /// - `PropagateRequestIdLayer` - echoes `x-request-id`
    /// - `IpFilterLayer` - `403` for denied clients
    /// - `CatchPanicLayer` - panics become `500`
    ///
    /// Also installs the JSON 404 fallback.
    fn with_default_layers(self, gateway: &Gateway) -> Self;

    /// Serve with graceful shutdown on SIGINT/SIGTERM.
    fn serve_with(
        self,
        gateway: &Gateway,
    ) -> impl std::future::Future<Output = Result<(), GatewayError>> + Send;
}

impl RouterExt for Router {
    fn with_fallback(self) -> Self {
        self.fallback(fallback_handler)
    }

    fn with_default_layers(self, gateway: &Gateway) -> Self {
        crate::layer::default_layers(self, gateway)
    }

    async fn serve_with(self, gateway: &Gateway) -> Result<(), GatewayError> {
        crate::server::serve_router(self, gateway).await
    }
}
