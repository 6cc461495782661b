//! Layered process configuration.
//!
//! Sources, later ones winning: built-in defaults, the YAML file given with
//! `--config`, `BOOKTEST__SECTION__KEY` environment variables, then CLI
//! overrides.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use transport_grpc::GrpcClientConfig;

pub const ENV_PREFIX: &str = "BOOKTEST__";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Figment(Box<figment::Error>),

    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("failed to render configuration: {0}")]
    Render(String),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub backend: BackendConfig,
    pub logging: LoggingConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,

    /// Largest accepted request body.
    pub body_limit_bytes: usize,

    /// Time granted to in-flight requests once shutdown starts.
    #[serde(with = "humantime_serde")]
    pub shutdown_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8080)),
            body_limit_bytes: gateway_runtime::mux::DEFAULT_MAX_BODY_BYTES,
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

/// The `books.v1` endpoint every route forwards to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct BackendConfig {
    pub endpoint: String,

    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,

    pub max_retries: u32,

    #[serde(with = "humantime_serde")]
    pub base_backoff: Duration,

    #[serde(with = "humantime_serde")]
    pub max_backoff: Duration,

    /// Start serving before the backend is reachable; calls fail with
    /// `Unavailable` until it is.
    pub lazy: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        let client = GrpcClientConfig::default();
        Self {
            endpoint: "http://127.0.0.1:50051".to_owned(),
            connect_timeout: client.connect_timeout,
            max_retries: client.max_retries,
            base_backoff: client.base_backoff,
            max_backoff: client.max_backoff,
            lazy: false,
        }
    }
}

impl BackendConfig {
    #[must_use]
    pub fn client_config(&self) -> GrpcClientConfig {
        GrpcClientConfig::new(books_sdk::SERVICE_NAME)
            .with_connect_timeout(self.connect_timeout)
            .with_max_retries(self.max_retries)
            .with_backoff(self.base_backoff, self.max_backoff)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `info,gateway_runtime=debug`.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: LogFormat::Text,
        }
    }
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub bind: Option<SocketAddr>,
    pub verbose: u8,
}

impl AppConfig {
    /// Merge defaults, the optional YAML file and the environment.
    ///
    /// # Errors
    /// Fails when `path` does not exist, a source cannot be parsed, or the
    /// merged values are invalid.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, Env::prefixed(ENV_PREFIX).split("__"))
    }

    fn load_with_env(path: Option<&Path>, env: Env) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            if !path.is_file() {
                return Err(ConfigError::FileNotFound(path.display().to_string()));
            }
            figment = figment.merge(Yaml::file(path));
        }

        let config: Self = figment.merge(env).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `--bind` and `-v`. Verbosity only raises the level.
    pub fn apply_cli_overrides(&mut self, cli: &CliOverrides) {
        if let Some(bind) = cli.bind {
            self.server.bind_addr = bind;
        }
        let level = match cli.verbose {
            0 => return,
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        level.clone_into(&mut self.logging.level);
    }

    /// Render as YAML.
    ///
    /// # Errors
    /// Fails when serialization fails.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_saphyr::to_string(self).map_err(|e| ConfigError::Render(e.to_string()))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.body_limit_bytes == 0 {
            return Err(ConfigError::Invalid(
                "server.body_limit_bytes must be positive".to_owned(),
            ));
        }
        if !(self.backend.endpoint.starts_with("http://")
            || self.backend.endpoint.starts_with("https://"))
        {
            return Err(ConfigError::Invalid(format!(
                "backend.endpoint must be an http(s) URI, got '{}'",
                self.backend.endpoint
            )));
        }
        if self.backend.base_backoff > self.backend.max_backoff {
            return Err(ConfigError::Invalid(
                "backend.base_backoff exceeds backend.max_backoff".to_owned(),
            ));
        }
        Ok(())
    }
}
