// src/compose/commander.rs

//! `docker-compose` command construction.
//!
//! Each option struct knows how to render itself as arguments via an explicit
//! `to_args()`; the field set is fixed, so there is no generic
//! struct-to-flags machinery.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;
use tokio::process::Command;

pub const DEFAULT_EXECUTABLE: &str = "docker-compose";

const BUILD_CMD: &str = "build";
const UP_CMD: &str = "up";

/// Small helper that accumulates flags in order.
#[derive(Debug, Default)]
struct Args(Vec<String>);

impl Args {
    fn flag(&mut self, name: &str, enabled: bool) -> &mut Self {
        if enabled {
            self.0.push(name.to_string());
        }
        self
    }

    fn value(&mut self, name: &str, value: Option<impl fmt::Display>) -> &mut Self {
        if let Some(v) = value {
            self.0.push(name.to_string());
            self.0.push(v.to_string());
        }
        self
    }

    fn repeated(&mut self, name: &str, values: &[impl fmt::Display]) -> &mut Self {
        for v in values {
            self.0.push(name.to_string());
            self.0.push(v.to_string());
        }
        self
    }

    fn pairs(&mut self, name: &str, map: &BTreeMap<String, impl fmt::Display>) -> &mut Self {
        for (k, v) in map {
            self.0.push(name.to_string());
            self.0.push(format!("{k}={v}"));
        }
        self
    }

    fn finish(&mut self) -> Vec<String> {
        std::mem::take(&mut self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ComposeLogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl fmt::Display for ComposeLogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ComposeLogLevel::Debug => "DEBUG",
            ComposeLogLevel::Info => "INFO",
            ComposeLogLevel::Warning => "WARNING",
            ComposeLogLevel::Error => "ERROR",
            ComposeLogLevel::Critical => "CRITICAL",
        };
        f.write_str(s)
    }
}

/// Global flags placed before the subcommand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CommanderOptions {
    pub files: Vec<PathBuf>,
    pub project_name: Option<String>,
    pub verbose: bool,
    pub log_level: Option<ComposeLogLevel>,
    pub no_ansi: bool,
    pub host: Option<String>,
    pub tls: bool,
    pub tls_ca_cert: Option<PathBuf>,
    pub tls_cert: Option<PathBuf>,
    pub tls_key: Option<PathBuf>,
    pub tls_verify: bool,
    pub skip_hostname_check: bool,
    pub project_directory: Option<PathBuf>,
    pub compatibility: bool,
}

impl CommanderOptions {
    pub fn to_args(&self) -> Vec<String> {
        let files: Vec<_> = self.files.iter().map(|f| f.display()).collect();
        Args::default()
            .repeated("-f", &files)
            .value("-p", self.project_name.as_ref())
            .flag("--verbose", self.verbose)
            .value("--log-level", self.log_level)
            .flag("--no-ansi", self.no_ansi)
            .value("-H", self.host.as_ref())
            .flag("--tls", self.tls)
            .value("--tlscacert", self.tls_ca_cert.as_ref().map(|p| p.display()))
            .value("--tlscert", self.tls_cert.as_ref().map(|p| p.display()))
            .value("--tlskey", self.tls_key.as_ref().map(|p| p.display()))
            .flag("--tlsverify", self.tls_verify)
            .flag("--skip-hostname-check", self.skip_hostname_check)
            .value(
                "--project-directory",
                self.project_directory.as_ref().map(|p| p.display()),
            )
            .flag("--compatibility", self.compatibility)
            .finish()
    }
}

/// Flags for `docker-compose build`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    pub compress: bool,
    pub force_rm: bool,
    pub no_cache: bool,
    pub pull: bool,
    pub memory: Option<String>,
    pub build_args: BTreeMap<String, String>,
    pub parallel: bool,
}

impl BuildOptions {
    pub fn to_args(&self) -> Vec<String> {
        Args::default()
            .flag("--compress", self.compress)
            .flag("--force-rm", self.force_rm)
            .flag("--no-cache", self.no_cache)
            .flag("--pull", self.pull)
            .value("-m", self.memory.as_ref())
            .pairs("--build-arg", &self.build_args)
            .flag("--parallel", self.parallel)
            .finish()
    }
}

/// Flags for `docker-compose up`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UpOptions {
    pub detach: bool,
    pub no_color: bool,
    pub quiet_pull: bool,
    pub no_deps: bool,
    pub force_recreate: bool,
    pub always_recreate_deps: bool,
    pub no_recreate: bool,
    pub no_build: bool,
    pub no_start: bool,
    pub build: bool,
    pub abort_on_container_exit: bool,
    pub timeout: Option<u32>,
    pub renew_anon_volumes: bool,
    pub remove_orphans: bool,
    pub exit_code_from: Option<String>,
    pub scale: BTreeMap<String, u32>,
}

impl UpOptions {
    pub fn to_args(&self) -> Vec<String> {
        Args::default()
            .flag("-d", self.detach)
            .flag("--no-color", self.no_color)
            .flag("--quiet-pull", self.quiet_pull)
            .flag("--no-deps", self.no_deps)
            .flag("--force-recreate", self.force_recreate)
            .flag("--always-recreate-deps", self.always_recreate_deps)
            .flag("--no-recreate", self.no_recreate)
            .flag("--no-build", self.no_build)
            .flag("--no-start", self.no_start)
            .flag("--build", self.build)
            .flag("--abort-on-container-exit", self.abort_on_container_exit)
            .value("-t", self.timeout)
            .flag("-V", self.renew_anon_volumes)
            .flag("--remove-orphans", self.remove_orphans)
            .value("--exit-code-from", self.exit_code_from.as_ref())
            .pairs("--scale", &self.scale)
            .finish()
    }
}

/// Builds `docker-compose` commands sharing one set of global flags.
#[derive(Debug, Clone)]
pub struct Commander {
    executable: String,
    global_args: Vec<String>,
}

impl Commander {
    pub fn new(executable: impl Into<String>, options: &CommanderOptions) -> Self {
        Self {
            executable: executable.into(),
            global_args: options.to_args(),
        }
    }

    pub fn executable(&self) -> &str {
        &self.executable
    }

    /// Full argument list (without the executable) for `subcommand`.
    pub fn args(&self, subcommand: &str, extra: Vec<String>) -> Vec<String> {
        let mut args = self.global_args.clone();
        args.push(subcommand.to_string());
        args.extend(extra);
        args
    }

    fn command(&self, subcommand: &str, extra: Vec<String>) -> Command {
        let mut cmd = Command::new(&self.executable);
        cmd.args(self.args(subcommand, extra));
        cmd
    }

    pub fn build(&self, options: &BuildOptions) -> Command {
        self.command(BUILD_CMD, options.to_args())
    }

    pub fn up(&self, options: &UpOptions) -> Command {
        self.command(UP_CMD, options.to_args())
    }
}
