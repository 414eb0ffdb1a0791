use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use http::header::CONTENT_TYPE;
use http::{Extensions, HeaderValue, Request, Response, StatusCode};
use tower::{Layer, Service};

use crate::ipfilter::IpFilter;

/// Reads the transport peer address from request extensions.
pub type PeerAddrFn = fn(&Extensions) -> Option<SocketAddr>;

/// How blocked requests are answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rejection {
    /// `403 Forbidden` with an empty body.
    #[default]
    Http,
    /// Trailers-only gRPC response with `PERMISSION_DENIED`.
    Grpc,
}

/// Peer address as recorded by axum's `into_make_service_with_connect_info`.
pub fn axum_peer_addr(extensions: &Extensions) -> Option<SocketAddr> {
    extensions
        .get::<axum::extract::ConnectInfo<SocketAddr>>()
        .map(|info| info.0)
}

/// Tower layer that rejects clients denied by an [`IpFilter`].
///
/// A layer built without a filter passes every request through.
#[derive(Clone)]
pub struct IpFilterLayer {
    filter: Option<Arc<IpFilter>>,
    rejection: Rejection,
    peer_addr: PeerAddrFn,
}

impl IpFilterLayer {
    pub fn new(filter: IpFilter) -> Self {
        Self::from_option(Some(filter))
    }

    pub fn from_option(filter: Option<IpFilter>) -> Self {
        Self {
            filter: filter.map(Arc::new),
            rejection: Rejection::Http,
            peer_addr: axum_peer_addr,
        }
    }

    /// Pass-through layer.
    pub fn disabled() -> Self {
        Self::from_option(None)
    }

    pub fn rejection(mut self, rejection: Rejection) -> Self {
        self.rejection = rejection;
        self
    }

    pub fn peer_addr(mut self, peer_addr: PeerAddrFn) -> Self {
        self.peer_addr = peer_addr;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.filter.is_some()
    }
}

impl<S> Layer<S> for IpFilterLayer {
    type Service = IpFilterService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        IpFilterService {
            inner,
            filter: self.filter.clone(),
            rejection: self.rejection,
            peer_addr: self.peer_addr,
        }
    }
}

#[derive(Clone)]
pub struct IpFilterService<S> {
    inner: S,
    filter: Option<Arc<IpFilter>>,
    rejection: Rejection,
    peer_addr: PeerAddrFn,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for IpFilterService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    ReqBody: Send + 'static,
    ResBody: Default + Send + 'static,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        if let Some(filter) = &self.filter {
            let peer = (self.peer_addr)(req.extensions());
            if !filter.allows_request(req.headers(), peer) {
                let client = filter.client_ip(req.headers(), peer);
                tracing::warn!(client = ?client, path = %req.uri().path(), "Request blocked by IP filter");
                let response = rejection_response(self.rejection);
                return Box::pin(async move { Ok(response) });
            }
        }

        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move { inner.call(req).await })
    }
}

fn rejection_response<B: Default>(rejection: Rejection) -> Response<B> {
    let mut response = Response::new(B::default());
    match rejection {
        Rejection::Http => {
            *response.status_mut() = StatusCode::FORBIDDEN;
        }
        Rejection::Grpc => {
            let headers = response.headers_mut();
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/grpc"));
            headers.insert("grpc-status", HeaderValue::from_static("7"));
            headers.insert("grpc-message", HeaderValue::from_static("permission%20denied"));
        }
    }
    response
}
