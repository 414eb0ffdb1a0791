//! Handler errors travel through the response interceptor and come out of
//! the gateway with the HTTP status the service chose.

use anyhow::Context;
use axum::body::Body;
use axum::extract::{ConnectInfo, Path};
use axum::http::{Request, StatusCode};
use axum::routing::get;
use axum::Router;
use gateway_kit_grpc::{ResponseError, ResponseInterceptor, StatusResponse};
use gateway_kit_rest::{Forward, Gateway, GatewayConfig, RouterExt};
use http_body_util::BodyExt;
use serde::Serialize;
use std::net::SocketAddr;
use tower::ServiceExt;

#[derive(Clone, PartialEq, prost::Message, Serialize)]
struct ComponentVersionsResponse {
    #[prost(message, optional, tag = "1")]
    status: Option<StatusResponse>,
    #[prost(string, tag = "2")]
    purl: String,
    #[prost(string, repeated, tag = "3")]
    versions: Vec<String>,
}

gateway_kit_grpc::impl_with_status!(ComponentVersionsResponse);

async fn lookup(purl: &str) -> anyhow::Result<ComponentVersionsResponse> {
    if !purl.starts_with("pkg:") {
        return Err(ResponseError::bad_request(format!("invalid purl: {purl}")).into());
    }
    if purl.ends_with("missing") {
        return Err(ResponseError::not_found(purl)).context("looking up versions");
    }
    if purl.ends_with("broken") {
        anyhow::bail!("connection reset by peer");
    }
    Ok(ComponentVersionsResponse {
        status: Some(StatusResponse::success("Success")),
        purl: purl.to_string(),
        versions: vec!["1.0.0".to_string(), "1.1.0".to_string()],
    })
}

async fn versions(Path(purl): Path<String>) -> Forward<ComponentVersionsResponse> {
    Forward(ResponseInterceptor::new().wrap(lookup(&purl)).await)
}

fn app() -> Router {
    let gateway = Gateway::setup(GatewayConfig::default()).unwrap();
    Router::new()
        .route("/v2/components/versions/{*purl}", get(versions))
        .with_default_layers(&gateway)
}

async fn get_json(purl: &str) -> (StatusCode, serde_json::Value) {
    let mut req = Request::builder()
        .uri(format!("/v2/components/versions/{purl}"))
        .body(Body::empty())
        .unwrap();
    let peer: SocketAddr = "127.0.0.1:40000".parse().unwrap();
    req.extensions_mut().insert(ConnectInfo(peer));

    let response = app().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn success_is_200_with_body() {
    let (status, body) = get_json("pkg:github/scanoss/engine").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"]["status"], "SUCCESS");
    assert_eq!(body["versions"], serde_json::json!(["1.0.0", "1.1.0"]));
}

#[tokio::test]
async fn bad_request_is_400_with_failed_status() {
    let (status, body) = get_json("engine").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"]["status"], "FAILED");
    assert_eq!(body["status"]["message"], "invalid purl: engine");
    assert_eq!(body["versions"], serde_json::json!([]));
}

#[tokio::test]
async fn wrapped_not_found_is_404() {
    let (status, body) = get_json("pkg:github/scanoss/missing").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["status"]["message"],
        "pkg:github/scanoss/missing not found"
    );
}

#[tokio::test]
async fn unclassified_error_is_500_with_generic_message() {
    let (status, body) = get_json("pkg:github/scanoss/broken").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"]["status"], "FAILED");
    assert_eq!(body["status"]["message"], "internal server error");
}
