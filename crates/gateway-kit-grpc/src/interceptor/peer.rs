//! IP filtering for gRPC calls.

use std::net::SocketAddr;

use gateway_kit::{IpFilter, IpFilterLayer, Rejection};
use http::Extensions;
use tonic::transport::server::{TcpConnectInfo, TlsConnectInfo};

/// Peer address recorded by tonic's transport, plain or TLS.
pub fn tonic_peer_addr(extensions: &Extensions) -> Option<SocketAddr> {
    extensions
        .get::<TcpConnectInfo>()
        .and_then(TcpConnectInfo::remote_addr)
        .or_else(|| {
            extensions
                .get::<TlsConnectInfo<TcpConnectInfo>>()
                .and_then(|info| info.get_ref().remote_addr())
        })
}

/// An [`IpFilterLayer`] that reads tonic peer addresses and answers blocked
/// clients with `PERMISSION_DENIED`. `None` gives a pass-through layer.
pub fn ip_filter_layer(filter: Option<IpFilter>) -> IpFilterLayer {
    IpFilterLayer::from_option(filter)
        .rejection(Rejection::Grpc)
        .peer_addr(tonic_peer_addr)
}
