// src/config/loader.rs

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::config::model::{ConfigFile, Overrides, RawConfigFile};
use crate::errors::{ComposeWatchError, Result};

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| {
        ComposeWatchError::ConfigError(format!("reading config file at {path:?}: {e}"))
    })?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load an optional config file, apply CLI overrides and validate.
///
/// Without a path every section starts from its defaults.
pub fn load_and_validate(path: Option<&Path>, overrides: Overrides) -> Result<ConfigFile> {
    let mut raw = match path {
        Some(path) => {
            debug!(?path, "loading config file");
            load_from_path(path)?
        }
        None => RawConfigFile::default(),
    };
    raw.apply(overrides);
    ConfigFile::try_from(raw)
}
