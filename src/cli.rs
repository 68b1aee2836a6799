// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::Overrides;

/// Command-line arguments for `compose-watcher`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "compose-watcher",
    version,
    about = "Rebuild and restart a docker-compose project when its sources change.",
    long_about = None
)]
pub struct CliArgs {
    /// Compose file to read and pass to docker-compose. Repeatable.
    ///
    /// Default: `docker-compose.yml`, unless the config file lists files.
    #[arg(short = 'f', long = "file", value_name = "PATH")]
    pub files: Vec<PathBuf>,

    /// Optional config file (TOML).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Quiet window in milliseconds before a batch of changes is acted on.
    #[arg(long, value_name = "MS")]
    pub throttle_ms: Option<u64>,

    /// docker-compose executable to run.
    #[arg(long, value_name = "PATH")]
    pub compose_bin: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `COMPOSE_WATCHER_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Read the compose files, print services and watch roots, run nothing.
    #[arg(long)]
    pub dry_run: bool,
}

impl CliArgs {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            files: self.files.clone(),
            throttle_ms: self.throttle_ms,
            executable: self.compose_bin.clone(),
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_files_and_overrides() {
        let args = CliArgs::try_parse_from([
            "compose-watcher",
            "-f",
            "a.yml",
            "--file",
            "b.yml",
            "--throttle-ms",
            "250",
            "--compose-bin",
            "docker-compose-v1",
        ])
        .unwrap();

        let o = args.overrides();
        assert_eq!(o.files, vec![PathBuf::from("a.yml"), PathBuf::from("b.yml")]);
        assert_eq!(o.throttle_ms, Some(250));
        assert_eq!(o.executable.as_deref(), Some("docker-compose-v1"));
        assert!(!args.dry_run);
    }

    #[test]
    fn no_flags_means_no_overrides() {
        let args = CliArgs::try_parse_from(["compose-watcher", "--dry-run"]).unwrap();
        let o = args.overrides();
        assert!(o.files.is_empty());
        assert!(o.throttle_ms.is_none());
        assert!(args.dry_run);
        assert!(args.config.is_none());
    }
}
