use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::engagement::RecomputeSettings;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub engine: EngineConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            engine: EngineConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Timeouts, batch sizing, and data source for the scoring engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub store_timeout: Duration,
    pub trigger_timeout: Duration,
    pub batch_concurrency: usize,
    pub recompute_interval: Option<Duration>,
    pub snapshot_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let recompute = RecomputeSettings::default();
        Self {
            store_timeout: Duration::from_millis(5_000),
            trigger_timeout: recompute.trigger_timeout,
            batch_concurrency: recompute.batch_concurrency,
            recompute_interval: None,
            snapshot_path: None,
        }
    }
}

impl EngineConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let store_timeout = match read_u64("APP_STORE_TIMEOUT_MS")? {
            Some(0) => return Err(ConfigError::InvalidNumber { key: "APP_STORE_TIMEOUT_MS" }),
            Some(ms) => Duration::from_millis(ms),
            None => defaults.store_timeout,
        };

        let trigger_timeout = match read_u64("APP_TRIGGER_TIMEOUT_MS")? {
            Some(0) => return Err(ConfigError::InvalidNumber { key: "APP_TRIGGER_TIMEOUT_MS" }),
            Some(ms) => Duration::from_millis(ms),
            None => defaults.trigger_timeout,
        };

        let batch_concurrency = match read_u64("APP_BATCH_CONCURRENCY")? {
            Some(0) => return Err(ConfigError::InvalidNumber { key: "APP_BATCH_CONCURRENCY" }),
            Some(value) => usize::try_from(value)
                .map_err(|_| ConfigError::InvalidNumber { key: "APP_BATCH_CONCURRENCY" })?,
            None => defaults.batch_concurrency,
        };

        // Zero disables the schedule, same as leaving it unset.
        let recompute_interval = read_u64("APP_RECOMPUTE_INTERVAL_SECS")?
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        let snapshot_path = env::var("APP_SNAPSHOT_PATH")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            store_timeout,
            trigger_timeout,
            batch_concurrency,
            recompute_interval,
            snapshot_path,
        })
    }

    pub fn recompute_settings(&self) -> RecomputeSettings {
        RecomputeSettings {
            trigger_timeout: self.trigger_timeout,
            batch_concurrency: self.batch_concurrency,
        }
    }
}

fn read_u64(key: &'static str) -> Result<Option<u64>, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber { key }),
        Err(_) => Ok(None),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key } => {
                write!(f, "{key} must be a positive integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidNumber { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
