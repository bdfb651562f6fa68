//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::{HostConfig, ProxyData};
use crate::config::validation::{validate_config, ValidationError};

/// File name of the route table inside the host root.
pub const ROUTES_FILE: &str = "proxies.toml";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate the host configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<HostConfig, ConfigError> {
    let config: HostConfig = read_toml(path)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Path of the routes file for a host root.
pub fn routes_path(root_path: &Path) -> PathBuf {
    root_path.join(ROUTES_FILE)
}

/// Load the raw route table from `<root_path>/proxies.toml`.
///
/// A missing file yields an empty table; the host then serves no proxies.
pub fn load_proxy_data(root_path: &Path) -> Result<ProxyData, ConfigError> {
    let path = routes_path(root_path);
    if !path.exists() {
        tracing::warn!(path = ?path, "Routes file not found, starting with no proxies");
        return Ok(ProxyData::default());
    }
    read_toml(&path)
}

fn read_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
