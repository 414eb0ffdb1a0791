//! Layers and interceptors for gRPC requests.

mod peer;
mod request_id;
pub mod response;
mod trace;

pub use peer::{ip_filter_layer, tonic_peer_addr};
pub use request_id::{RequestIdLayer, RequestIdService, REQUEST_ID_HEADER};
pub use response::{
    find_response_error, handle, resolve, response_interceptor, Resolution, ResponseInterceptor,
    HTTP_CODE_METADATA, UNHANDLED_MESSAGE,
};
pub use trace::{TraceLayer, TraceService};
