// src/errors.rs

//! Crate-wide error type and result alias.
//!
//! Setup errors (bad roots, adapter construction) are returned directly to the
//! caller. Runtime errors travel as data on the listener/provider streams, so
//! every variant here has to be cheap to carry through a channel.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ComposeWatchError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("not a directory: {0:?}")]
    NotADirectory(PathBuf),

    #[error("stat failed on {path:?}: {source}")]
    StatFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("recursive walk of {path:?} failed: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("file watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error("failed to update watch on {path:?}: {source}")]
    WatchPath {
        path: PathBuf,
        #[source]
        source: Box<ComposeWatchError>,
    },

    #[error("service '{0}' is defined multiple times")]
    DuplicateService(String),

    #[error("unsupported compose file version: {0}")]
    UnsupportedVersion(String),

    #[error("invalid build section in service '{service}': {reason}")]
    InvalidBuild { service: String, reason: String },

    #[error("{0} is closed")]
    Closed(&'static str),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ComposeWatchError>;
