// src/listener/mod.rs

//! Recursive directory listener.
//!
//! Watches a set of root directories and every directory below them, on top of
//! a non-recursive [`PathWatcher`]. Each raw event triggers a reconciliation of
//! every root containing the event path:
//!
//! 1. walk the root again and build a fresh [`DirectorySnapshot`],
//! 2. diff it against the stored snapshot,
//! 3. unwatch removed directories, then watch added ones,
//! 4. replace the stored snapshot.
//!
//! The event is forwarded afterwards either way; a failed reconciliation is
//! attached to the event's `error` field and the loop keeps going.

pub mod snapshot;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::{ComposeWatchError, Result};
use crate::fs::{EntryKind, FileSystem};
use crate::lock;
use crate::types::ChangeEvent;
use crate::watch::PathWatcher;
use crate::watch::path_utils::{absolute, is_within, resolve};

pub use snapshot::{path_diff, DirectorySnapshot, WatchSetDelta};

/// Capacity of the normalized event stream handed to consumers.
const EVENT_BUFFER: usize = 64;

/// State shared between the caller (`add_root`) and the run loop.
struct Shared {
    watcher: Box<dyn PathWatcher>,
    fs: Arc<dyn FileSystem>,
    roots: Mutex<HashMap<PathBuf, DirectorySnapshot>>,
}

impl Shared {
    /// Walk, diff, apply and store for a single root.
    ///
    /// Runs with the snapshot map locked, so two reconciliations never
    /// interleave.
    fn reconcile_locked(
        &self,
        roots: &mut HashMap<PathBuf, DirectorySnapshot>,
        root: &Path,
    ) -> Result<()> {
        let fresh = DirectorySnapshot::walk(self.fs.as_ref(), root)?;
        let delta = roots
            .get(root)
            .map(|old| old.diff(&fresh))
            .unwrap_or_else(|| DirectorySnapshot::default().diff(&fresh));

        if !delta.is_empty() {
            debug!(
                ?root,
                added = delta.added.len(),
                removed = delta.removed.len(),
                "applying watch-set delta"
            );
        }
        self.apply(root, &delta)?;

        roots.insert(root.to_path_buf(), fresh);
        Ok(())
    }

    /// Removals strictly before additions.
    fn apply(&self, root: &Path, delta: &WatchSetDelta) -> Result<()> {
        for rel in &delta.removed {
            let path = resolve(root, rel);
            self.watcher
                .remove_path(&path)
                .map_err(|source| ComposeWatchError::WatchPath {
                    path,
                    source: Box::new(source),
                })?;
        }
        for rel in &delta.added {
            let path = resolve(root, rel);
            self.watcher
                .add_path(&path)
                .map_err(|source| ComposeWatchError::WatchPath {
                    path,
                    source: Box::new(source),
                })?;
        }
        Ok(())
    }

    fn reconcile(&self, root: &Path) -> Result<()> {
        let mut roots = lock(&self.roots);
        self.reconcile_locked(&mut roots, root)
    }

    /// Reconcile every tracked root that contains `path`.
    ///
    /// All matching roots are attempted; the first failure is returned.
    fn reconcile_containing(&self, path: &Path) -> Result<()> {
        let mut roots = lock(&self.roots);
        let matching: Vec<PathBuf> = roots
            .keys()
            .filter(|root| is_within(root, path))
            .cloned()
            .collect();

        let mut first_err = None;
        for root in matching {
            if let Err(err) = self.reconcile_locked(&mut roots, &root) {
                warn!(?root, error = %err, "reconciliation failed");
                first_err.get_or_insert(err);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

/// Recursively watches directories and forwards normalized change events.
pub struct RecursiveListener {
    shared: Arc<Shared>,
    close_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl std::fmt::Debug for RecursiveListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecursiveListener")
            .field("roots", &self.roots())
            .finish_non_exhaustive()
    }
}

impl RecursiveListener {
    /// Create a listener on top of `watcher` and start its run loop.
    ///
    /// Returns the listener together with its event stream. The stream closes
    /// when the listener is closed or the watcher's own stream ends.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(
        watcher: Box<dyn PathWatcher>,
        fs: Arc<dyn FileSystem>,
    ) -> Result<(Self, mpsc::Receiver<ChangeEvent>)> {
        let raw_rx = watcher
            .take_events()
            .ok_or(ComposeWatchError::Closed("watcher event stream"))?;

        let shared = Arc::new(Shared {
            watcher,
            fs,
            roots: Mutex::new(HashMap::new()),
        });

        let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);
        let (close_tx, close_rx) = oneshot::channel();

        let handle = tokio::spawn(run(Arc::clone(&shared), raw_rx, event_tx, close_rx));

        Ok((
            Self {
                shared,
                close_tx,
                handle,
            },
            event_rx,
        ))
    }

    /// Start watching `path` and everything below it.
    ///
    /// The whole tree is walked eagerly; every directory found (the root
    /// included) is registered with the watcher before this returns.
    pub fn add_root(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        match self.shared.fs.stat(path) {
            Ok(EntryKind::Dir) => {}
            Ok(_) => return Err(ComposeWatchError::NotADirectory(path.to_path_buf())),
            Err(source) => {
                return Err(ComposeWatchError::StatFailure {
                    path: path.to_path_buf(),
                    source,
                });
            }
        }

        let root = absolute(path)?;
        self.shared.reconcile(&root)?;
        info!(?root, "watching root recursively");
        Ok(())
    }

    /// Currently tracked roots, sorted.
    pub fn roots(&self) -> Vec<PathBuf> {
        let mut roots: Vec<PathBuf> = lock(&self.shared.roots).keys().cloned().collect();
        roots.sort();
        roots
    }

    /// Last stored snapshot for `root`.
    pub fn snapshot(&self, root: &Path) -> Option<DirectorySnapshot> {
        lock(&self.shared.roots).get(root).cloned()
    }

    /// Stop the run loop, then release the watcher.
    ///
    /// Blocks until the loop has acknowledged the stop.
    pub async fn close(self) -> Result<()> {
        let Self {
            shared,
            close_tx,
            handle,
        } = self;

        // The loop may already be gone if the watcher stream ended.
        let _ = close_tx.send(());
        if let Err(err) = handle.await {
            warn!(error = %err, "listener loop terminated abnormally");
        }

        lock(&shared.roots).clear();
        shared.watcher.close()
    }
}

async fn run(
    shared: Arc<Shared>,
    mut raw_rx: mpsc::UnboundedReceiver<ChangeEvent>,
    event_tx: mpsc::Sender<ChangeEvent>,
    mut close_rx: oneshot::Receiver<()>,
) {
    debug!("listener loop started");

    loop {
        let raw = tokio::select! {
            _ = &mut close_rx => break,
            raw = raw_rx.recv() => match raw {
                Some(raw) => raw,
                None => {
                    debug!("watcher stream closed");
                    break;
                }
            },
        };

        let event = handle_raw(&shared, raw).await;

        tokio::select! {
            _ = &mut close_rx => break,
            sent = event_tx.send(event) => {
                if sent.is_err() {
                    debug!("listener receiver dropped");
                    break;
                }
            }
        }
    }

    debug!("listener loop finished");
}

/// Normalize a raw watcher event and reconcile the roots it touches.
async fn handle_raw(shared: &Arc<Shared>, raw: ChangeEvent) -> ChangeEvent {
    if raw.is_error() {
        return raw;
    }

    let path = match absolute(&raw.path) {
        Ok(p) => p,
        Err(err) => return ChangeEvent::failed(err.into()),
    };

    debug!(?path, op = ?raw.op, "raw event");

    // Walking is blocking IO.
    let task_shared = Arc::clone(shared);
    let task_path = path.clone();
    let outcome =
        tokio::task::spawn_blocking(move || task_shared.reconcile_containing(&task_path)).await;

    let error = match outcome {
        Ok(Ok(())) => None,
        Ok(Err(err)) => Some(err),
        Err(join_err) => Some(ComposeWatchError::Other(anyhow::anyhow!(
            "reconciliation task failed: {join_err}"
        ))),
    };

    ChangeEvent {
        path,
        op: raw.op,
        error,
    }
}
