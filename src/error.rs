//! Error types

use thiserror::Error;

/// Errors returned by the simulation engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine was torn down with `destroy()`; it accepts no further calls
    #[error("engine has been destroyed")]
    Destroyed,
    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),
}

/// Errors loading tuning files
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

/// Errors loading level catalogs
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse level data: {0}")]
    Parse(#[from] serde_json::Error),
}
