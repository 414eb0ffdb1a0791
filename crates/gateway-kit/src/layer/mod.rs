//! Tower layers shared by the gRPC server and the REST gateway.

mod ip_filter;

pub use ip_filter::{axum_peer_addr, IpFilterLayer, IpFilterService, PeerAddrFn, Rejection};
