// src/watch/mod.rs

//! Path watcher adapters.
//!
//! This module is responsible for:
//! - The [`PathWatcher`] capability every notification backend implements
//!   (add a path, remove a path, close, hand out the event stream).
//! - A `notify`-backed implementation, [`NotifyWatcher`], watching each
//!   registered path non-recursively.
//! - Path helpers shared by the listener (normalisation, containment).
//!
//! Recursion is **not** handled here; the recursive listener keeps the set of
//! watched directories in sync with the tree on top of this capability.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::errors::Result;
use crate::types::ChangeEvent;

pub mod notify_watcher;
pub mod path_utils;

pub use notify_watcher::NotifyWatcher;

/// Filesystem notification backend.
///
/// Methods take `&self` so a watcher can be shared between the caller and a
/// background task; implementations use interior mutability.
pub trait PathWatcher: Send + Sync {
    /// Start watching `path` (non-recursively).
    fn add_path(&self, path: &Path) -> Result<()>;

    /// Stop watching `path`.
    fn remove_path(&self, path: &Path) -> Result<()>;

    /// Release the backend. The event stream closes afterwards.
    fn close(&self) -> Result<()>;

    /// Hand out the event stream. Returns `None` once it has been taken.
    fn take_events(&self) -> Option<mpsc::UnboundedReceiver<ChangeEvent>>;
}

/// Constructor for fresh watchers, used wherever a component needs to build
/// a new backend at runtime (e.g. when the controller replaces its listener).
pub type WatcherFactory = Arc<dyn Fn() -> Result<Box<dyn PathWatcher>> + Send + Sync>;

/// Factory producing [`NotifyWatcher`]s.
pub fn notify_factory() -> WatcherFactory {
    Arc::new(|| Ok(Box::new(NotifyWatcher::new()?) as Box<dyn PathWatcher>))
}
