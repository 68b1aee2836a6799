// src/exec/backend.rs

//! Pluggable rebuild backend.
//!
//! The controller talks to a `RebuildBackend` instead of spawning processes
//! itself, so tests can swap in a fake that only records calls.
//!
//! - `ComposeBackend` is the production implementation: it runs
//!   `docker-compose build` to completion and then keeps one
//!   `docker-compose up` child alive until the next rebuild or shutdown.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use anyhow::{Context, anyhow};
use tokio::process::Child;
use tracing::{debug, info, warn};

use crate::compose::{BuildOptions, Commander, UpOptions};
use crate::errors::Result;

/// Trait abstracting how the compose project is rebuilt.
pub trait RebuildBackend: Send {
    /// Stop whatever is running, rebuild the images and start again.
    fn rebuild_and_restart(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Stop whatever is running. Called once when the controller exits.
    fn shutdown(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// How long `up` gets to stop its containers after an interrupt.
pub const DEFAULT_STOP_GRACE: Duration = Duration::from_secs(10);

/// Backend shelling out to `docker-compose`.
///
/// Child processes inherit stdio, so compose output goes straight to the
/// terminal. A running `up` is interrupted (SIGINT) so compose can stop its
/// containers, and only killed if it is still alive after the grace period.
#[derive(Debug)]
pub struct ComposeBackend {
    commander: Commander,
    build: BuildOptions,
    up: UpOptions,
    grace: Duration,
    running: Option<Child>,
}

impl ComposeBackend {
    pub fn new(commander: Commander, build: BuildOptions, up: UpOptions) -> Self {
        Self {
            commander,
            build,
            up,
            grace: DEFAULT_STOP_GRACE,
            running: None,
        }
    }

    pub fn with_stop_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    async fn stop_running(&mut self) -> Result<()> {
        let Some(mut child) = self.running.take() else {
            return Ok(());
        };

        if let Ok(Some(status)) = child.try_wait() {
            debug!(%status, "compose up had already exited");
            return Ok(());
        }

        if interrupt(&child) {
            info!("interrupting running compose up");
            match tokio::time::timeout(self.grace, child.wait()).await {
                Ok(Ok(status)) => {
                    info!(%status, "compose up stopped");
                    return Ok(());
                }
                Ok(Err(err)) => warn!(error = %err, "waiting for compose up failed; killing"),
                Err(_) => warn!(grace = ?self.grace, "compose up still running; killing"),
            }
        }

        child
            .kill()
            .await
            .context("killing running docker-compose up")?;
        Ok(())
    }

    async fn run_build(&self) -> Result<()> {
        info!(executable = self.commander.executable(), "running compose build");
        let status = self
            .commander
            .build(&self.build)
            .status()
            .await
            .context("spawning docker-compose build")?;

        if !status.success() {
            return Err(anyhow!("docker-compose build failed with {status}").into());
        }
        Ok(())
    }

    fn start_up(&mut self) -> Result<()> {
        let mut cmd = self.commander.up(&self.up);
        cmd.kill_on_drop(true);
        let child = cmd.spawn().context("spawning docker-compose up")?;
        info!(pid = child.id(), "compose up started");
        self.running = Some(child);
        Ok(())
    }
}

/// Send SIGINT to `child`. Returns false if no signal was delivered.
#[cfg(unix)]
fn interrupt(child: &Child) -> bool {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    let Some(pid) = child.id() else {
        return false;
    };
    match kill(Pid::from_raw(pid as i32), Signal::SIGINT) {
        Ok(()) => true,
        Err(err) => {
            warn!(pid, error = %err, "failed to interrupt compose up");
            false
        }
    }
}

#[cfg(not(unix))]
fn interrupt(_child: &Child) -> bool {
    false
}

impl RebuildBackend for ComposeBackend {
    fn rebuild_and_restart(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            self.stop_running().await?;
            self.run_build().await?;
            self.start_up()
        })
    }

    fn shutdown(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move { self.stop_running().await })
    }
}
