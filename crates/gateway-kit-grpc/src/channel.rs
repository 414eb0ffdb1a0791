//! Client channels built from [`ChannelConfig`].

use tonic::transport::{Channel, Endpoint};

use crate::config::ChannelConfig;
use crate::error::Error;

fn build_endpoint(config: &ChannelConfig) -> Result<Endpoint, Error> {
    let mut endpoint = Endpoint::from_shared(config.endpoint.clone())
        .map_err(|e| Error::InvalidEndpoint(e.to_string()))?
        .timeout(config.timeout())
        .connect_timeout(config.connect_timeout())
        .tcp_nodelay(config.tcp_nodelay)
        .tcp_keepalive(config.tcp_keepalive());

    if let Some(interval) = config.http2_keepalive_interval() {
        endpoint = endpoint.http2_keep_alive_interval(interval);
    }
    if let Some(timeout) = config.http2_keepalive_timeout() {
        endpoint = endpoint.keep_alive_timeout(timeout);
    }

    if let Some(tls_config) = config.tls_config()? {
        endpoint = endpoint.tls_config(tls_config).map_err(Error::tls)?;
    }

    Ok(endpoint)
}

/// Connect a tonic [`Channel`] from configuration.
///
/// ```ignore
/// let config = ChannelConfig::builder()
///     .endpoint("https://localhost:50051")
///     .tls("/etc/ssl/server.crt", "localhost")
///     .build()?;
/// let client = ComponentsClient::new(Channel::connect_lazy(&config)?);
/// ```
pub trait ChannelExt: Sized {
    /// Connect now; fails if the server is unreachable.
    fn connect(
        config: &ChannelConfig,
    ) -> impl std::future::Future<Output = Result<Channel, Error>> + Send;

    /// Connect on first request.
    fn connect_lazy(config: &ChannelConfig) -> Result<Channel, Error>;
}

impl ChannelExt for Channel {
    async fn connect(config: &ChannelConfig) -> Result<Channel, Error> {
        let endpoint = build_endpoint(config)?;
        tracing::debug!(endpoint = %config.endpoint, tls = config.is_tls_enabled(), "Connecting gRPC channel");
        endpoint.connect().await.map_err(Error::from)
    }

    fn connect_lazy(config: &ChannelConfig) -> Result<Channel, Error> {
        let endpoint = build_endpoint(config)?;
        Ok(endpoint.connect_lazy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_lazy_creates_channel() {
        let config = ChannelConfig {
            endpoint: "http://localhost:50051".to_string(),
            connect_timeout_secs: 5,
            ..Default::default()
        };
        assert!(Channel::connect_lazy(&config).is_ok());
    }

    #[test]
    fn invalid_endpoint_is_rejected() {
        let config = ChannelConfig {
            endpoint: "not a valid url".to_string(),
            ..Default::default()
        };
        assert!(matches!(build_endpoint(&config), Err(Error::InvalidEndpoint(_))));
    }

    #[tokio::test]
    async fn connect_to_closed_port_fails() {
        let config = ChannelConfig {
            endpoint: "http://127.0.0.1:1".to_string(),
            connect_timeout_secs: 1,
            ..Default::default()
        };
        assert!(matches!(
            Channel::connect(&config).await,
            Err(Error::Connection(_))
        ));
    }
}
