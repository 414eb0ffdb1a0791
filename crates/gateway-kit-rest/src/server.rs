//! Serving the gateway, plain or TLS.

use std::net::{SocketAddr, TcpListener};
use std::time::Duration;

use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;

use crate::error::GatewayError;
use crate::Gateway;

/// How long in-flight requests may run after a shutdown signal.
pub const SHUTDOWN_DRAIN: Duration = Duration::from_secs(30);

/// Serve a router until SIGINT or SIGTERM, then drain for up to
/// [`SHUTDOWN_DRAIN`].
pub async fn serve_router(router: Router, gateway: &Gateway) -> Result<(), GatewayError> {
    let config = gateway.config();
    let addr = config.addr();
    let listener = bind(&addr)?;

    let handle = Handle::new();
    let shutdown = tokio::spawn(shutdown_on_signal(handle.clone()));
    let app = router.into_make_service_with_connect_info::<SocketAddr>();

    let result = if gateway.is_tls_enabled() {
        // tonic and axum-server share one rustls build; pick its provider once.
        let _ = rustls::crypto::ring::default_provider().install_default();
        let tls = RustlsConfig::from_pem_file(&config.tls.cert_path, &config.tls.key_path)
            .await
            .map_err(|e| {
                tracing::error!(file = %config.tls.cert_path, error = %e, "Problem loading TLS file");
                GatewayError::tls(e)
            })?;

        tracing::info!(addr = %addr, grpc_target = %gateway.channel_config().endpoint, "starting REST server with TLS on {addr} ...");
        axum_server::from_tcp_rustls(listener, tls)
            .handle(handle)
            .serve(app)
            .await
    } else {
        tracing::info!(addr = %addr, grpc_target = %gateway.channel_config().endpoint, "starting REST server on {addr} ...");
        axum_server::from_tcp(listener)
            .handle(handle)
            .serve(app)
            .await
    };

    shutdown.abort();
    result.map_err(GatewayError::Runtime)?;

    tracing::info!("REST server shutdown complete");
    Ok(())
}

fn bind(addr: &str) -> Result<TcpListener, GatewayError> {
    let bind_error = |source| GatewayError::Bind {
        addr: addr.to_string(),
        source,
    };
    let listener = TcpListener::bind(addr).map_err(bind_error)?;
    listener.set_nonblocking(true).map_err(bind_error)?;
    Ok(listener)
}

async fn shutdown_on_signal(handle: Handle) {
    gateway_kit::shutdown_signal().await;
    handle.graceful_shutdown(Some(SHUTDOWN_DRAIN));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GatewayConfig;

    #[tokio::test]
    async fn bind_failure_is_reported() {
        let taken = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = taken.local_addr().unwrap().port();

        let gateway = Gateway::setup(GatewayConfig {
            host: "127.0.0.1".to_string(),
            port,
            ..Default::default()
        })
        .unwrap();

        let err = serve_router(Router::new(), &gateway).await.unwrap_err();
        assert!(matches!(err, GatewayError::Bind { .. }), "got {err}");
    }
}
