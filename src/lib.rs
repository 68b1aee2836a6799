// src/lib.rs

pub mod cli;
pub mod compose;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod listener;
pub mod logging;
pub mod provider;
pub mod throttle;
pub mod types;
pub mod watch;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::compose::{ComposeReader, Commander, translate, watch_roots};
use crate::config::{ConfigFile, load_and_validate};
use crate::engine::ComposeController;
use crate::exec::ComposeBackend;
use crate::fs::{FileSystem, RealFileSystem};
use crate::provider::Reader;
use crate::watch::notify_factory;

/// Lock a mutex, recovering the data if a previous holder panicked.
///
/// Everything guarded this way is either rebuilt wholesale on the next use
/// (watch-set snapshots) or append-only, so a poisoned value is still usable.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (file + CLI overrides)
/// - the compose reader / change provider
/// - the rebuild backend
/// - the controller loop
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_and_validate(args.config.as_deref(), args.overrides())?;
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);

    if args.dry_run {
        print_dry_run(&cfg, fs)?;
        return Ok(());
    }

    let commander = Commander::new(cfg.compose.executable.clone(), &cfg.compose.options);
    let backend = ComposeBackend::new(commander, cfg.build.clone(), cfg.up.clone());
    let reader = ComposeReader::new(Arc::clone(&fs));

    let controller = ComposeController::new(
        reader,
        cfg.compose_files(),
        notify_factory(),
        fs,
        backend,
        cfg.watch.throttle(),
    )?;

    // Ctrl-C → graceful shutdown.
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C; stop with SIGKILL");
            std::future::pending::<()>().await;
        }
    };

    info!(files = ?cfg.compose_files(), "watching compose project");
    controller.run(shutdown).await?;
    Ok(())
}

/// Simple dry-run output: print services, their watch paths and the roots.
fn print_dry_run(cfg: &ConfigFile, fs: Arc<dyn FileSystem>) -> Result<()> {
    let mut reader = ComposeReader::new(fs);
    for file in cfg.compose_files() {
        reader.add(file)?;
    }
    let services = translate(&reader.read_services()?);

    println!("compose-watcher dry-run");
    println!("  compose.executable = {}", cfg.compose.executable);
    println!("  watch.throttle_ms = {}", cfg.watch.throttle_ms);
    println!("  files = {:?}", cfg.compose_files());
    println!();

    println!("services ({}):", services.len());
    for (name, service) in services.iter() {
        println!("  - {name}");
        match service.watch_dir() {
            Some(dir) => println!("      watch: {}", dir.display()),
            None => println!("      watch: (nothing)"),
        }
    }
    println!();

    let roots = watch_roots(&services);
    println!("watch roots ({}):", roots.len());
    for root in &roots {
        println!("  - {}", root.display());
    }

    debug!("dry-run complete (no execution)");
    Ok(())
}
