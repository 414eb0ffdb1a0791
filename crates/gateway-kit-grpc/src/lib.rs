//! # gateway-kit-grpc
//!
//! tonic helpers for services that sit behind an HTTP gateway.
//!
//! Handlers return `anyhow::Result`. [`ResponseInterceptor`] turns a failure
//! into a success-shaped reply carrying a [`StatusResponse`], and records the
//! HTTP code the gateway should answer with in `x-http-code` metadata.
//!
//! ## Server
//!
//! ```ignore
//! use gateway_kit_grpc::{GrpcServerConfig, RouterExt, ServerExt};
//! use tonic::transport::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config: GrpcServerConfig = GrpcServerConfig::builder()
//!         .with_dotenv()
//!         .build()?;
//!     let ip_filter = config.ip_filter.load()?;
//!
//!     Server::builder()
//!         .with_config(&config)?
//!         .with_default_layers(ip_filter)
//!         .add_service(ComponentsServer::new(service))
//!         .serve_with(&config)
//!         .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Handler
//!
//! ```ignore
//! impl_with_status!(ComponentVersionsResponse);
//!
//! async fn get_component_versions(
//!     &self,
//!     request: Request<ComponentRequest>,
//! ) -> Result<Response<ComponentVersionsResponse>, Status> {
//!     ResponseInterceptor::new()
//!         .wrap(self.versions(request.into_inner()))
//!         .await
//! }
//! ```
//!
//! ## Features
//!
//! - `tracing` - Enable logging initialization (default)
//! - `database` - SQL helpers from `gateway-kit`
//! - `otel` - OpenTelemetry providers from `gateway-kit`
//! - `full` - Enable all features

mod channel;
pub mod config;
mod domain;
mod error;
pub mod interceptor;
mod response_error;
mod server;
mod status;

pub use channel::ChannelExt;
pub use config::{
    ChannelConfig, ChannelConfigBuilder, ConfigBuilder, ConfigError, Environment,
    GrpcServerConfig,
};
pub use domain::{ComponentStatus, ComponentStatusCode, ErrorCode};
pub use error::{Error, ServerError};
pub use response_error::{codes, ResponseError};
pub use server::{DefaultLayers, RouterExt, ServerExt};
pub use status::{inject_status, StatusCode, StatusResponse, WithStatus};

pub use interceptor::{
    handle, resolve, response_interceptor, RequestIdLayer, Resolution, ResponseInterceptor,
    TraceLayer, HTTP_CODE_METADATA, REQUEST_ID_HEADER,
};

pub use gateway_kit::{shutdown_signal, IpFilter, IpFilterConfig, LogFormat, TlsConfig};
pub use tonic::{Code, Request, Response, Status};

#[cfg(feature = "tracing")]
pub use gateway_kit::{init_logging, init_logging_from_env};
