//! Server extension traits for tonic.

use std::net::SocketAddr;

use gateway_kit::{IpFilter, IpFilterLayer};
use tonic::transport::server::{Router, Server};
use tower::layer::util::Stack;

use crate::config::GrpcServerConfig;
use crate::error::{Error, ServerError};
use crate::interceptor::{ip_filter_layer, RequestIdLayer, TraceLayer};

/// Layer stack added by [`ServerExt::with_default_layers`], outermost first:
/// request id, tracing, IP filter.
pub type DefaultLayers<L> = Stack<IpFilterLayer, Stack<TraceLayer, Stack<RequestIdLayer, L>>>;

/// Extension trait for `tonic::transport::Server`.
pub trait ServerExt: Sized {
    type WithLayers;

    /// Applies the default middleware stack. Blocked clients are answered
    /// with `PERMISSION_DENIED` before reaching any service.
    fn with_default_layers(self, ip_filter: Option<IpFilter>) -> Self::WithLayers;

    /// Applies timeouts, TCP options, stream limits and TLS from config.
    fn with_config(self, config: &GrpcServerConfig) -> Result<Self, Error>;
}

impl<L> ServerExt for Server<L> {
    type WithLayers = Server<DefaultLayers<L>>;

    fn with_default_layers(self, ip_filter: Option<IpFilter>) -> Self::WithLayers {
        self.layer(RequestIdLayer::new())
            .layer(TraceLayer::new())
            .layer(ip_filter_layer(ip_filter))
    }

    fn with_config(self, config: &GrpcServerConfig) -> Result<Self, Error> {
        let server = self
            .timeout(config.request_timeout())
            .tcp_keepalive(config.tcp_keepalive())
            .tcp_nodelay(config.tcp_nodelay)
            .max_concurrent_streams(config.max_concurrent_streams);

        match config.tls_config()? {
            Some(tls) => server.tls_config(tls).map_err(Error::tls),
            None => Ok(server),
        }
    }
}

/// Extension trait for `tonic::transport::server::Router`.
pub trait RouterExt<L>: Sized {
    /// Serve on the configured address until SIGINT or SIGTERM.
    fn serve_with(
        self,
        config: &(impl AsRef<GrpcServerConfig> + Sync),
    ) -> impl std::future::Future<Output = Result<(), ServerError>> + Send;

    /// Serve at a specific address with graceful shutdown.
    fn serve_at(
        self,
        addr: SocketAddr,
    ) -> impl std::future::Future<Output = Result<(), ServerError>> + Send;
}

impl<L> RouterExt<L> for Router<L>
where
    L: tower::Layer<tonic::service::Routes> + Clone + Send + 'static,
    L::Service: tower::Service<
            http::Request<tonic::body::BoxBody>,
            Response = http::Response<tonic::body::BoxBody>,
        > + Clone
        + Send
        + 'static,
    <L::Service as tower::Service<http::Request<tonic::body::BoxBody>>>::Future: Send,
    <L::Service as tower::Service<http::Request<tonic::body::BoxBody>>>::Error:
        Into<Box<dyn std::error::Error + Send + Sync>> + Send,
{
    async fn serve_with(
        self,
        config: &(impl AsRef<GrpcServerConfig> + Sync),
    ) -> Result<(), ServerError> {
        let config = config.as_ref();
        let addr = config.socket_addr()?;

        if config.is_tls_enabled()? {
            tracing::info!(addr = %addr, environment = %config.environment, "starting gRPC server with TLS on {addr}");
        } else {
            tracing::info!(addr = %addr, environment = %config.environment, "starting gRPC server on {addr}");
        }
        self.serve_at(addr).await
    }

    async fn serve_at(self, addr: SocketAddr) -> Result<(), ServerError> {
        tracing::info!(addr = %addr, "gRPC server listening");

        self.serve_with_shutdown(addr, gateway_kit::shutdown_signal())
            .await
            .map_err(ServerError::Transport)?;

        tracing::info!("gRPC server shutdown complete");
        Ok(())
    }
}
