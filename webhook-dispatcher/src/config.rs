//! Configuration module for environment variable parsing.
//!
//! All settings are read once at startup and shared as an immutable value.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

/// Environment variable holding the path to the route file.
pub const ROUTE_FILE_VAR: &str = "WEBHOOK_DISPATCHER_ROUTE_FILE";

/// Errors raised while building the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("WEBHOOK_DISPATCHER_ROUTE_FILE environment variable not set")]
    MissingRouteFile,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the TOML, JSON or YAML route file
    pub route_file: PathBuf,

    /// Port for the web server to listen on
    pub port: u16,

    /// Verbose logging of downstream responses
    pub debug: bool,

    /// Shared secret for `X-Hub-Signature-256` verification.
    /// When unset, requests are accepted without authentication.
    pub webhook_secret: Option<String>,

    /// Timeout in milliseconds for the outbound forward request
    pub forward_timeout_ms: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let route_file = env::var(ROUTE_FILE_VAR)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .ok_or(ConfigError::MissingRouteFile)?;

        Ok(Config {
            route_file,

            port: parse_number("WEBHOOK_DISPATCHER_PORT", 3000),

            debug: parse_flag("WEBHOOK_DISPATCHER_DEBUG"),

            webhook_secret: env::var("WEBHOOK_DISPATCHER_WEBHOOK_SECRET").ok(),

            forward_timeout_ms: parse_number("WEBHOOK_DISPATCHER_FORWARD_TIMEOUT_MS", 10_000),
        })
    }

    /// Build a configuration for the given route file with defaults everywhere else.
    pub fn with_route_file(route_file: impl Into<PathBuf>) -> Self {
        Config {
            route_file: route_file.into(),
            port: 3000,
            debug: false,
            webhook_secret: None,
            forward_timeout_ms: 10_000,
        }
    }

    /// Outbound forward timeout as a `Duration`.
    pub fn forward_timeout(&self) -> Duration {
        Duration::from_millis(self.forward_timeout_ms)
    }
}

/// Load variables from a `.env` file into the process environment.
///
/// Variables that are already set win over the file. With no `path`, `.env`
/// is searched for in the working directory and its parents. Returns the
/// file that was loaded, if any.
pub fn load_env_file(path: Option<&Path>) -> Option<PathBuf> {
    match path {
        Some(path) => dotenvy::from_path(path).ok().map(|_| path.to_path_buf()),
        None => dotenvy::dotenv().ok(),
    }
}

/// Parse a numeric variable, keeping the default when unset or malformed.
fn parse_number<T: std::str::FromStr + Copy>(name: &str, default: T) -> T {
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    match raw.trim().parse::<T>() {
        Ok(value) => value,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid numeric value, using default");
            default
        }
    }
}

/// A flag is on when the variable is set to anything non-empty.
fn parse_flag(name: &str) -> bool {
    env::var(name).map(|v| !v.is_empty()).unwrap_or(false)
}
