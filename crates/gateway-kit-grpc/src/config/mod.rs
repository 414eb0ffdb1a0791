//! Configuration types for gRPC servers and clients.

mod channel;
mod server;

pub use channel::{ChannelConfig, ChannelConfigBuilder};
pub use server::GrpcServerConfig;

pub use gateway_kit::{ConfigBuilder, ConfigError, Environment, IpFilterConfig, TlsConfig};
