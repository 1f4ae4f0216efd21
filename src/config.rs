use std::env;
use std::num::ParseIntError;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_RATE_LIMIT: usize = 5;
const DEFAULT_DB_PATH: &str = "data/ip2country.txt";
const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 300;
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {var} value {value:?}: {source}")]
    InvalidNumber {
        var: &'static str,
        value: String,
        source: ParseIntError,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Listening port
    pub port: u16,

    /// Admissions per client per second
    pub rate_limit: usize,

    /// Path to the backing record file
    pub ip2country_db: PathBuf,

    /// Idle rate-limit state sweep period in seconds, 0 disables the sweep
    pub cleanup_interval_secs: u64,

    /// Default tracing filter level
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            rate_limit: DEFAULT_RATE_LIMIT,
            ip2country_db: PathBuf::from(DEFAULT_DB_PATH),
            cleanup_interval_secs: DEFAULT_CLEANUP_INTERVAL_SECS,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to the
    /// defaults for anything unset or empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = parse_env("PORT", DEFAULT_PORT)?;
        let rate_limit = match parse_env("RATE_LIMIT", DEFAULT_RATE_LIMIT)? {
            // A zero limit counts as unset
            0 => DEFAULT_RATE_LIMIT,
            limit => limit,
        };
        let cleanup_interval_secs =
            parse_env("CLEANUP_INTERVAL", DEFAULT_CLEANUP_INTERVAL_SECS)?;
        let ip2country_db = PathBuf::from(env_or("IP2COUNTRY_DB", DEFAULT_DB_PATH));
        let log_level = env_or("LOG_LEVEL", DEFAULT_LOG_LEVEL);

        Ok(Self {
            port,
            rate_limit,
            ip2country_db,
            cleanup_interval_secs,
            log_level,
        })
    }
}

fn env_or(var: &str, default: &str) -> String {
    match env::var(var) {
        Ok(value) if !value.is_empty() => value,
        _ => default.to_string(),
    }
}

fn parse_env<T>(var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr<Err = ParseIntError>,
{
    match env::var(var) {
        Ok(value) if !value.is_empty() => value
            .parse()
            .map_err(|source| ConfigError::InvalidNumber { var, value, source }),
        _ => Ok(default),
    }
}
