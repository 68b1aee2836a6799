// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{ComposeWatchError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = ComposeWatchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_watch(cfg)?;
    validate_compose(cfg)?;
    Ok(())
}

fn validate_watch(cfg: &RawConfigFile) -> Result<()> {
    if cfg.watch.throttle_ms == 0 {
        return Err(ComposeWatchError::ConfigError(
            "[watch].throttle_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_compose(cfg: &RawConfigFile) -> Result<()> {
    if cfg.compose.executable.trim().is_empty() {
        return Err(ComposeWatchError::ConfigError(
            "[compose].executable must not be empty".to_string(),
        ));
    }
    if cfg.compose.options.files.is_empty() {
        return Err(ComposeWatchError::ConfigError(
            "at least one compose file is required".to_string(),
        ));
    }
    if let Some(file) = cfg
        .compose
        .options
        .files
        .iter()
        .find(|f| f.as_os_str().is_empty())
    {
        return Err(ComposeWatchError::ConfigError(format!(
            "compose file path must not be empty (got {file:?})"
        )));
    }
    Ok(())
}
