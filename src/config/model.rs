// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::compose::commander::DEFAULT_EXECUTABLE;
use crate::compose::{BuildOptions, CommanderOptions, UpOptions};

/// Compose file used when neither the CLI nor the config names one.
pub const DEFAULT_COMPOSE_FILE: &str = "docker-compose.yml";

/// Top-level configuration as read from a TOML file, before validation.
///
/// ```toml
/// [watch]
/// throttle_ms = 500
///
/// [compose]
/// executable = "docker-compose"
/// project_name = "demo"
/// files = ["docker-compose.yml"]
///
/// [build]
/// no_cache = true
///
/// [up]
/// remove_orphans = true
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub compose: ComposeSection,

    /// Flags for `docker-compose build`.
    #[serde(default)]
    pub build: BuildOptions,

    /// Flags for `docker-compose up`.
    #[serde(default)]
    pub up: UpOptions,
}

/// `[watch]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WatchSection {
    /// Quiet window applied to both the compose and the source change streams.
    #[serde(default = "default_throttle_ms")]
    pub throttle_ms: u64,
}

fn default_throttle_ms() -> u64 {
    500
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            throttle_ms: default_throttle_ms(),
        }
    }
}

impl WatchSection {
    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }
}

/// `[compose]` section: the executable plus the global compose flags.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ComposeSection {
    #[serde(default = "default_executable")]
    pub executable: String,

    #[serde(flatten)]
    pub options: CommanderOptions,
}

fn default_executable() -> String {
    DEFAULT_EXECUTABLE.to_string()
}

impl Default for ComposeSection {
    fn default() -> Self {
        Self {
            executable: default_executable(),
            options: CommanderOptions::default(),
        }
    }
}

/// Values given on the command line; each one set here wins over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub files: Vec<PathBuf>,
    pub throttle_ms: Option<u64>,
    pub executable: Option<String>,
}

impl RawConfigFile {
    /// Apply CLI overrides, then fall back to `docker-compose.yml` if no
    /// compose file was named anywhere.
    pub fn apply(&mut self, overrides: Overrides) {
        if !overrides.files.is_empty() {
            self.compose.options.files = overrides.files;
        }
        if self.compose.options.files.is_empty() {
            self.compose.options.files = vec![PathBuf::from(DEFAULT_COMPOSE_FILE)];
        }
        if let Some(ms) = overrides.throttle_ms {
            self.watch.throttle_ms = ms;
        }
        if let Some(exe) = overrides.executable {
            self.compose.executable = exe;
        }
    }
}

/// Validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>`, so holders can rely on a
/// non-zero throttle window, a non-empty executable and at least one compose
/// file.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub watch: WatchSection,
    pub compose: ComposeSection,
    pub build: BuildOptions,
    pub up: UpOptions,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            watch: raw.watch,
            compose: raw.compose,
            build: raw.build,
            up: raw.up,
        }
    }

    pub fn compose_files(&self) -> &[PathBuf] {
        &self.compose.options.files
    }
}
