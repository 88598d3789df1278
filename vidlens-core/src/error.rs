use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io { source: io::Error, path: PathBuf },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        source: toml::de::Error,
        path: PathBuf,
    },
}

/// A provider credential required by an operation was never configured.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{provider} API key is not configured (expected in ${env_var})")]
pub struct ConfigurationError {
    pub provider: &'static str,
    pub env_var: String,
}

pub type Result<T> = std::result::Result<T, ConfigError>;
