//! Route file loading.
//!
//! The file is read and parsed on every call; nothing is cached, so edits to
//! the route file apply to the next webhook without a restart.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use super::types::RouteTable;

/// Errors raised while loading a route file.
#[derive(Debug, Error)]
pub enum RouteFileError {
    #[error("route file {} not found", .path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read route file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("route file {} is not in TOML, JSON, or YAML format", .path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("invalid {format} route file: {message}")]
    Parse { format: RouteFormat, message: String },
}

/// Route file syntax, chosen by file suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteFormat {
    Toml,
    Json,
    Yaml,
}

impl RouteFormat {
    /// Determine the format from the path suffix (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self, RouteFileError> {
        let suffix = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match suffix.as_deref() {
            Some("toml") => Ok(Self::Toml),
            Some("json") => Ok(Self::Json),
            Some("yaml") | Some("yml") => Ok(Self::Yaml),
            _ => Err(RouteFileError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}

impl fmt::Display for RouteFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Toml => "TOML",
            Self::Json => "JSON",
            Self::Yaml => "YAML",
        };
        f.write_str(name)
    }
}

/// Read and parse the route file at `path`.
pub async fn load_route_table(path: &Path) -> Result<RouteTable, RouteFileError> {
    let format = RouteFormat::from_path(path)?;

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => RouteFileError::NotFound {
                path: path.to_path_buf(),
            },
            _ => RouteFileError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;

    debug!(
        path = %path.display(),
        format = %format,
        content_length = content.len(),
        "route_file_read"
    );

    parse_route_table(&content, format)
}

/// Parse route file content in the given format.
///
/// Blank content is an empty table in every format.
pub fn parse_route_table(content: &str, format: RouteFormat) -> Result<RouteTable, RouteFileError> {
    if content.trim().is_empty() {
        return Ok(RouteTable::new());
    }

    let value = match format {
        RouteFormat::Toml => parse_toml(content),
        RouteFormat::Json => parse_json(content),
        RouteFormat::Yaml => parse_yaml(content),
    }
    .map_err(|message| RouteFileError::Parse { format, message })?;

    RouteTable::from_value(&value).ok_or_else(|| RouteFileError::Parse {
        format,
        message: "top-level value must be a mapping of owners".to_string(),
    })
}

fn parse_toml(content: &str) -> Result<Value, String> {
    toml::from_str(content).map_err(|e| e.to_string())
}

fn parse_json(content: &str) -> Result<Value, String> {
    serde_json::from_str(content).map_err(|e| e.to_string())
}

/// Merge keys (`<<: *anchor`) are resolved before conversion.
fn parse_yaml(content: &str) -> Result<Value, String> {
    let mut value: serde_yaml::Value = serde_yaml::from_str(content).map_err(|e| e.to_string())?;
    value.apply_merge().map_err(|e| e.to_string())?;
    serde_json::to_value(value).map_err(|e| e.to_string())
}
