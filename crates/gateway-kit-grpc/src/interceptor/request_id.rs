//! Request ID layer.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use http::HeaderValue;
use tower::{Layer, Service};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Tower layer that gives every call an `x-request-id` and echoes it back
/// in the response headers.
#[derive(Clone, Copy, Default)]
pub struct RequestIdLayer;

impl RequestIdLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for RequestIdLayer {
    type Service = RequestIdService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestIdService { inner }
    }
}

#[derive(Clone)]
pub struct RequestIdService<S> {
    inner: S,
}

impl<S, ReqBody, ResBody> Service<http::Request<ReqBody>> for RequestIdService<S>
where
    S: Service<http::Request<ReqBody>, Response = http::Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    ReqBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: http::Request<ReqBody>) -> Self::Future {
        let request_id = match req.headers().get(REQUEST_ID_HEADER) {
            Some(value) => Some(value.clone()),
            None => {
                let generated = HeaderValue::from_str(&Uuid::new_v4().to_string()).ok();
                if let Some(value) = &generated {
                    req.headers_mut().insert(REQUEST_ID_HEADER, value.clone());
                }
                generated
            }
        };

        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let mut response = inner.call(req).await?;
            if let Some(value) = request_id {
                response.headers_mut().entry(REQUEST_ID_HEADER).or_insert(value);
            }
            Ok(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Request as HttpRequest;
    use std::convert::Infallible;
    use tower::ServiceExt;

    #[derive(Clone)]
    struct MockService;

    impl<B> Service<HttpRequest<B>> for MockService {
        type Response = http::Response<String>;
        type Error = Infallible;
        type Future = std::future::Ready<Result<Self::Response, Self::Error>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: HttpRequest<B>) -> Self::Future {
            let request_id = req
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-")
                .to_string();

            std::future::ready(Ok(http::Response::new(request_id)))
        }
    }

    #[tokio::test]
    async fn generates_request_id() {
        let service = RequestIdLayer::new().layer(MockService);
        let req = HttpRequest::builder()
            .uri("/scanoss.api.components.v2.Components/GetVersions")
            .body(())
            .unwrap();

        let response = service.oneshot(req).await.unwrap();
        let echoed = response.headers().get(REQUEST_ID_HEADER).unwrap().clone();
        let body = response.into_body();

        assert!(Uuid::parse_str(&body).is_ok(), "Expected UUID, got: {body}");
        assert_eq!(echoed, body.as_str());
    }

    #[tokio::test]
    async fn preserves_existing_request_id() {
        let service = RequestIdLayer::new().layer(MockService);
        let req = HttpRequest::builder()
            .uri("/test")
            .header(REQUEST_ID_HEADER, "my-custom-id")
            .body(())
            .unwrap();

        let response = service.oneshot(req).await.unwrap();
        assert_eq!(response.headers().get(REQUEST_ID_HEADER).unwrap(), "my-custom-id");
        assert_eq!(response.into_body(), "my-custom-id");
    }
}
