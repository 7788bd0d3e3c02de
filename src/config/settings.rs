//! Configuration settings for the calendar server.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that overrides the listen port.
pub const PORT_ENV: &str = "PORT";

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::ReadFile)?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default locations or use defaults.
    pub fn load() -> Result<Self> {
        let config_paths = [
            PathBuf::from("calendar.toml"),
            PathBuf::from("config.toml"),
            dirs::config_dir()
                .map(|p| p.join("calendar-server/config.toml"))
                .unwrap_or_default(),
        ];

        for path in &config_paths {
            if path.as_os_str().is_empty() {
                continue;
            }
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Config::default())
    }

    /// Apply environment overrides (`PORT`) read from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_port_override(std::env::var(PORT_ENV).ok().as_deref());
    }

    /// Apply a raw `PORT` value. Empty, missing or unparsable values leave the
    /// port untouched.
    pub fn apply_port_override(&mut self, raw: Option<&str>) {
        let Some(raw) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
            return;
        };
        match raw.parse::<u16>() {
            Ok(port) if port > 0 => self.server.port = port,
            _ => tracing::warn!(
                value = raw,
                port = self.server.port,
                "Ignoring invalid {PORT_ENV}, keeping configured port"
            ),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port must be > 0".to_string()).into());
        }
        if self.server.shutdown_timeout_secs == 0 {
            return Err(
                ConfigError::Invalid("server.shutdown_timeout_secs must be > 0".to_string()).into(),
            );
        }
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::Invalid("server.host must not be empty".to_string()).into());
        }
        Ok(())
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// HTTP port.
    pub port: u16,
    /// Drain window for in-flight requests after a shutdown signal.
    pub shutdown_timeout_secs: u64,
    /// Deadline handed to each service operation.
    pub request_timeout_secs: u64,
    /// Enable permissive CORS.
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout_secs: 5,
            request_timeout_secs: 10,
            enable_cors: false,
        }
    }
}

impl ServerConfig {
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// `None` disables the per-operation deadline.
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON log lines.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}
