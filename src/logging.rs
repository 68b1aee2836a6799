// src/logging.rs

//! Logging setup for `compose-watcher` using `tracing` + `tracing-subscriber`.
//!
//! The filter comes from the `--log-level` flag when given. Otherwise
//! `COMPOSE_WATCHER_LOG` is read as a full filter directive, so
//! `info,compose_watcher::listener=trace` works as well as a bare `debug`.
//! Without either, everything logs at `info`.
//!
//! Logs are sent to STDERR; stdout belongs to the docker-compose children.

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

pub const LOG_ENV: &str = "COMPOSE_WATCHER_LOG";

const DEFAULT_DIRECTIVE: &str = "info";

/// Initialise global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(LOG_ENV).ok();
    let filter = build_filter(cli_level, env.as_deref())?;

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("initialising logging: {e}"))?;

    Ok(())
}

fn build_filter(cli_level: Option<LogLevel>, env: Option<&str>) -> Result<EnvFilter> {
    let directive = match (cli_level, env.map(str::trim)) {
        (Some(lvl), _) => directive_for(lvl),
        (None, Some(env)) if !env.is_empty() => env,
        _ => DEFAULT_DIRECTIVE,
    };
    EnvFilter::try_new(directive).with_context(|| format!("invalid log filter {directive:?}"))
}

fn directive_for(lvl: LogLevel) -> &'static str {
    match lvl {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn flag_wins_over_env() {
        let filter = build_filter(Some(LogLevel::Warn), Some("trace")).unwrap();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));
    }

    #[test]
    fn env_accepts_per_module_directives() {
        let filter = build_filter(None, Some("warn,compose_watcher::listener=trace")).unwrap();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::TRACE));
    }

    #[test]
    fn defaults_to_info() {
        for env in [None, Some(""), Some("  ")] {
            let filter = build_filter(None, env).unwrap();
            assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO));
        }
    }

    #[test]
    fn rejects_garbage_env() {
        assert!(build_filter(None, Some("compose_watcher=loud")).is_err());
    }
}
