//! Layered configuration loading.
//!
//! Sources, lowest precedence first: `.env` files (they only seed the
//! process environment), one TOML/YAML/JSON file, then environment
//! variables with `__` between nested keys.

use std::env;
use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::de::DeserializeOwned;

/// Checked in order; the first one set fills the `environment` field.
const ENVIRONMENT_VARS: [&str; 3] = ["ENVIRONMENT", "APP_ENV", "RUST_ENV"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Failed to load {}: {source}", .path.display())]
    Dotenv {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Builder behind `GrpcServerConfig::builder()`, `GatewayConfig::builder()`
/// and the database and telemetry settings.
///
/// ```ignore
/// let config: GatewayConfig = ConfigBuilder::new()
///     .with_dotenv()
///     .with_config_file("gateway.yaml")
///     .build()?;
/// ```
///
/// `TLS__CERT_PATH=/etc/certs/server.pem` overrides `tls.cert_path` from the
/// file.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    dotenv: bool,
    env_files: Vec<PathBuf>,
    file: Option<PathBuf>,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `.env` from the working directory when there is one.
    pub fn with_dotenv(mut self) -> Self {
        self.dotenv = true;
        self
    }

    /// Add a file to load.
    ///
    /// `.env`-style names (`.env`, `.env.local`, `secrets.env`) are loaded
    /// into the process environment and must exist. Anything else is the
    /// config file, with the format taken from the extension; a later call
    /// replaces an earlier one.
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if is_env_file(&path) {
            self.env_files.push(path);
        } else {
            self.file = Some(path);
        }
        self
    }

    pub fn build<C: DeserializeOwned>(self) -> Result<C, ConfigError> {
        if self.dotenv {
            match dotenvy::dotenv() {
                Ok(_) => {}
                Err(err) if err.not_found() => {}
                Err(source) => {
                    return Err(ConfigError::Dotenv {
                        path: PathBuf::from(".env"),
                        source,
                    })
                }
            }
        }

        for path in &self.env_files {
            if !path.is_file() {
                return Err(ConfigError::NotFound(path.clone()));
            }
            dotenvy::from_path(path).map_err(|source| ConfigError::Dotenv {
                path: path.clone(),
                source,
            })?;
        }

        let mut builder = Config::builder();
        if let Some(path) = &self.file {
            if !path.is_file() {
                return Err(ConfigError::NotFound(path.clone()));
            }
            builder = builder.add_source(File::from(path.as_path()));
        }

        let config = builder
            .add_source(Environment::default().separator("__").try_parsing(true))
            .set_override_option("environment", environment_from_env())?
            .build()?;
        Ok(config.try_deserialize()?)
    }
}

fn is_env_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    name == "env"
        || name.starts_with(".env")
        || path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("env"))
}

fn environment_from_env() -> Option<String> {
    ENVIRONMENT_VARS.iter().find_map(|key| env::var(key).ok())
}
