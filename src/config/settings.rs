//! Environment-driven server settings.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3333;
pub const DEFAULT_STORE_PATH: &str = "csp-reports.json";
/// Browsers send small reports; 64KB leaves room for long policies.
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;

/// Invalid configuration value. Fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var}={value:?} is not a valid {expected}")]
    Invalid {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Runtime settings for the report server.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub store_path: PathBuf,
    pub max_body_bytes: usize,
    pub log_level: log::LevelFilter,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            log_level: log::LevelFilter::Info,
        }
    }
}

impl ServerConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` for variable values.
    ///
    /// `CSP_REPORTER_PORT` wins over `PORT` when both are set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup("CSP_REPORTER_HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("PORT") {
            config.port = parse_var("PORT", port, "port number")?;
        }
        if let Some(port) = lookup("CSP_REPORTER_PORT") {
            config.port = parse_var("CSP_REPORTER_PORT", port, "port number")?;
        }
        if let Some(path) = lookup("CSP_REPORTER_STORE_PATH") {
            config.store_path = PathBuf::from(path);
        }
        if let Some(limit) = lookup("CSP_REPORTER_MAX_BODY_BYTES") {
            config.max_body_bytes = parse_var("CSP_REPORTER_MAX_BODY_BYTES", limit, "byte count")?;
        }
        if let Some(level) = lookup("CSP_REPORTER_LOG_LEVEL") {
            config.log_level = parse_var("CSP_REPORTER_LOG_LEVEL", level, "log level")?;
        }

        Ok(config)
    }

    /// Socket address to bind.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse().map_err(|_| ConfigError::Invalid {
            var: "CSP_REPORTER_HOST",
            value: self.host.clone(),
            expected: "IP address",
        })
    }
}

fn parse_var<T: FromStr>(
    var: &'static str,
    value: String,
    expected: &'static str,
) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid {
            var,
            value,
            expected,
        })
}
