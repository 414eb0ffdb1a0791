//! # gateway-kit-rest
//!
//! An axum REST gateway in front of a tonic gRPC server running in the same
//! process or on the same host.
//!
//! Handlers call the gRPC service through a client built from
//! [`Gateway::connect_lazy`] and return [`forward_response`] (or
//! [`Forward`]). The HTTP status is taken from the `x-http-code` metadata the
//! gRPC response interceptor records, so a failed lookup that the service
//! answers with a `FAILED` status body still reaches REST clients as `400`.
//!
//! ```ignore
//! use gateway_kit_rest::{Forward, Gateway, GatewayConfig, RouterExt};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     gateway_kit_rest::init_logging_from_env();
//!     let config: GatewayConfig = GatewayConfig::builder().with_dotenv().build()?;
//!     let gateway = Gateway::setup(config)?;
//!     let client = ComponentsClient::new(gateway.connect_lazy()?);
//!
//!     Router::new()
//!         .route("/v2/components/versions", post(versions))
//!         .with_state(client)
//!         .with_default_layers(&gateway)
//!         .serve_with(&gateway)
//!         .await?;
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod gateway;
pub mod layer;
mod response;
mod router;
mod routes;
mod server;
mod status_map;

pub use config::{ConfigBuilder, ConfigError, Environment, GatewayConfig, IpFilterConfig, TlsConfig};
pub use error::{ErrorResponse, GatewayError};
pub use gateway::Gateway;
pub use response::{forward_response, http_code, Forward};
pub use router::RouterExt;
pub use routes::fallback_handler;
pub use server::{serve_router, SHUTDOWN_DRAIN};
pub use status_map::{grpc_code_name, grpc_to_http_status};

#[cfg(feature = "tracing")]
pub use gateway_kit::{init_logging, init_logging_from_env};
