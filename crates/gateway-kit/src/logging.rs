//! Logging initialization.

use std::{env, str::FromStr};

use crate::Environment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        })
    }
}

impl LogFormat {
    pub fn from_env() -> Self {
        env::var("LOG_FORMAT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    /// `LOG_FORMAT` when set, otherwise JSON in production and text elsewhere.
    pub fn for_environment(environment: Environment) -> Self {
        match env::var("LOG_FORMAT") {
            Ok(value) => value.parse().unwrap_or_default(),
            Err(_) if environment.is_production() => Self::Json,
            Err(_) => Self::Text,
        }
    }
}

#[cfg(feature = "tracing")]
pub fn init_logging(format: LogFormat, filter: &str) {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    let _ = match format {
        LogFormat::Text => fmt().with_env_filter(env_filter).try_init(),
        LogFormat::Json => fmt()
            .json()
            .with_current_span(true)
            .with_env_filter(env_filter)
            .try_init(),
    };
}

#[cfg(feature = "tracing")]
pub fn init_logging_from_env() {
    init_logging(LogFormat::from_env(), "info");
}

/// Initialize logging for a deployment environment; development also gets
/// `debug` output from this workspace's crates.
#[cfg(feature = "tracing")]
pub fn init_logging_for(environment: Environment) {
    let filter = if environment.is_production() {
        "info"
    } else {
        "info,gateway_kit=debug,gateway_kit_grpc=debug,gateway_kit_rest=debug"
    };
    init_logging(LogFormat::for_environment(environment), filter);
}
