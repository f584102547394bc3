// ABOUTME: Server configuration loaded from SLIPS_* environment variables
// ABOUTME: Applies defaults and rejects malformed values before anything starts

use std::env;
use std::num::ParseIntError;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {source}")]
    InvalidNumber {
        var: &'static str,
        #[source]
        source: ParseIntError,
    },
    #[error("Port {0} is out of valid range (1-65535)")]
    PortOutOfRange(u16),
    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("Invalid log format: {0} (expected 'pretty' or 'json')")]
    InvalidLogFormat(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(ConfigError::InvalidLogFormat(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwks_url: String,
    pub expected_issuer: String,
    pub request_timeout: Duration,
    pub shutdown_grace: Duration,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = parse_number::<u16>(get("SLIPS_PORT"), "SLIPS_PORT", 9090)?;
        if port == 0 {
            return Err(ConfigError::PortOutOfRange(port));
        }

        let database_max_connections = parse_number::<u32>(
            get("SLIPS_DATABASE_MAX_CONNECTIONS"),
            "SLIPS_DATABASE_MAX_CONNECTIONS",
            10,
        )?;
        if database_max_connections == 0 {
            return Err(ConfigError::NotPositive("SLIPS_DATABASE_MAX_CONNECTIONS"));
        }

        let request_timeout_secs = parse_number::<u64>(
            get("SLIPS_REQUEST_TIMEOUT_SECS"),
            "SLIPS_REQUEST_TIMEOUT_SECS",
            30,
        )?;
        if request_timeout_secs == 0 {
            return Err(ConfigError::NotPositive("SLIPS_REQUEST_TIMEOUT_SECS"));
        }

        let shutdown_grace_secs = parse_number::<u64>(
            get("SLIPS_SHUTDOWN_GRACE_SECS"),
            "SLIPS_SHUTDOWN_GRACE_SECS",
            10,
        )?;

        let jwks_url = get("SLIPS_JWKS_URL").ok_or(ConfigError::Missing("SLIPS_JWKS_URL"))?;

        let log_format = match get("SLIPS_LOG_FORMAT") {
            Some(value) => value.parse()?,
            None => LogFormat::default(),
        };

        Ok(Config {
            host: get("SLIPS_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            database_url: get("SLIPS_DATABASE_URL")
                .unwrap_or_else(|| "sqlite://slips.db".to_string()),
            database_max_connections,
            jwks_url,
            expected_issuer: get("SLIPS_EXPECTED_ISSUER")
                .unwrap_or_else(|| "identra".to_string()),
            request_timeout: Duration::from_secs(request_timeout_secs),
            shutdown_grace: Duration::from_secs(shutdown_grace_secs),
            log_format,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_number<T>(value: Option<String>, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr<Err = ParseIntError>,
{
    match value {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|source| ConfigError::InvalidNumber { var, source }),
        None => Ok(default),
    }
}
