//! # gateway-kit
//!
//! Shared utilities for services that run a tonic gRPC server with an axum
//! REST gateway in front of it.
//!
//! This crate holds the pieces used by both `gateway-kit-grpc` and
//! `gateway-kit-rest`: configuration loading, logging, TLS and list file
//! checks, IP filtering, and the shutdown signal.
//!
//! ## Features
//!
//! - `tracing` - Enable logging initialization with tracing-subscriber
//! - `database` - sqlx connection pool and traced queries
//! - `otel` - OpenTelemetry OTLP meter and tracer providers

mod config;
mod environment;
pub mod files;
pub mod ipfilter;
pub mod layer;
mod logging;
mod shutdown;
pub mod tls;

#[cfg(feature = "database")]
pub mod database;

#[cfg(feature = "otel")]
pub mod telemetry;

pub use config::{ConfigBuilder, ConfigError};
pub use environment::Environment;
pub use files::FileError;
pub use ipfilter::{IpFilter, IpFilterConfig, IpFilterOptions};
pub use layer::{IpFilterLayer, Rejection};
pub use logging::LogFormat;
pub use shutdown::shutdown_signal;
pub use tls::TlsConfig;

#[cfg(feature = "tracing")]
pub use logging::{init_logging, init_logging_for, init_logging_from_env};

#[cfg(feature = "database")]
pub use database::{DatabaseConfig, DatabaseError, QueryContext};

#[cfg(feature = "otel")]
pub use telemetry::{init_telemetry_providers, trace_sampler, TelemetryConfig, TelemetryGuard};
