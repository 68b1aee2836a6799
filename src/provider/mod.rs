// src/provider/mod.rs

//! Change provider: re-reads structured data whenever one of its source
//! files changes.
//!
//! The provider composes a [`Reader`] (knows how to turn registered files into
//! one value) with a [`PathWatcher`] (knows when those files change). A single
//! background task waits on three inputs:
//! - watcher events: an error is forwarded as-is, anything else triggers a read
//! - sync requests: trigger a read
//! - the close signal: stop and close the output stream
//!
//! Reader and watcher failures reach the consumer as `Err` values on the
//! stream; they never stop the loop.

use std::path::Path;
use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::errors::{ComposeWatchError, Result};
use crate::lock;
use crate::types::ChangeEvent;
use crate::watch::PathWatcher;

/// Capacity of the value stream handed to consumers.
const VALUE_BUFFER: usize = 16;

/// Source of the structured value the provider emits.
pub trait Reader: Send + 'static {
    type Value: Send + 'static;

    /// Register another source file.
    fn add(&mut self, path: &Path) -> Result<()>;

    /// Combine all registered sources into one value.
    fn read(&mut self) -> Result<Self::Value>;

    fn close(&mut self) -> Result<()>;
}

/// One provider emission: the freshly read value or why reading failed.
pub type ReaderResult<V> = Result<V>;

/// Watches source files and emits a re-read value on every change.
pub struct ChangeProvider<R: Reader> {
    reader: Arc<Mutex<R>>,
    watcher: Box<dyn PathWatcher>,
    sync_tx: mpsc::Sender<()>,
    close_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl<R: Reader> std::fmt::Debug for ChangeProvider<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeProvider").finish_non_exhaustive()
    }
}

impl<R: Reader> ChangeProvider<R> {
    /// Start a provider over `reader` and `watcher`.
    ///
    /// Returns the provider and its value stream. Must be called from within a
    /// Tokio runtime.
    pub fn new(
        reader: R,
        watcher: Box<dyn PathWatcher>,
    ) -> Result<(Self, mpsc::Receiver<ReaderResult<R::Value>>)> {
        let events = watcher
            .take_events()
            .ok_or(ComposeWatchError::Closed("watcher event stream"))?;

        let reader = Arc::new(Mutex::new(reader));
        let (value_tx, value_rx) = mpsc::channel(VALUE_BUFFER);
        // One pending sync at most; extra requests are coalesced.
        let (sync_tx, sync_rx) = mpsc::channel(1);
        let (close_tx, close_rx) = oneshot::channel();

        let handle = tokio::spawn(run(
            Arc::clone(&reader),
            events,
            sync_rx,
            value_tx,
            close_rx,
        ));

        Ok((
            Self {
                reader,
                watcher,
                sync_tx,
                close_tx,
                handle,
            },
            value_rx,
        ))
    }

    /// Register a source file.
    ///
    /// The reader is asked first; if it refuses, the watcher is never
    /// touched. On success an initial read is queued.
    pub fn add(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        lock(&self.reader).add(path)?;
        self.sync();
        self.watcher.add_path(path)?;
        debug!(?path, "provider source added");
        Ok(())
    }

    /// Request a full re-read. Never blocks; coalesces with a request that
    /// has not been picked up yet.
    pub fn sync(&self) {
        if self.sync_tx.try_send(()).is_err() {
            debug!("sync already pending; coalesced");
        }
    }

    /// Stop the loop, then close the reader and the watcher.
    ///
    /// Both are closed even if the first fails; the first error wins.
    pub async fn close(self) -> Result<()> {
        let Self {
            reader,
            watcher,
            sync_tx,
            close_tx,
            handle,
        } = self;
        drop(sync_tx);

        let _ = close_tx.send(());
        if let Err(err) = handle.await {
            warn!(error = %err, "provider loop terminated abnormally");
        }

        let reader_res = lock(&reader).close();
        let watcher_res = watcher.close();
        reader_res.and(watcher_res)
    }
}

enum Trigger {
    Watch(ChangeEvent),
    Sync,
}

async fn run<R: Reader>(
    reader: Arc<Mutex<R>>,
    mut events: mpsc::UnboundedReceiver<ChangeEvent>,
    mut sync_rx: mpsc::Receiver<()>,
    value_tx: mpsc::Sender<ReaderResult<R::Value>>,
    mut close_rx: oneshot::Receiver<()>,
) {
    debug!("provider loop started");

    loop {
        let trigger = tokio::select! {
            _ = &mut close_rx => break,
            event = events.recv() => match event {
                Some(event) => Trigger::Watch(event),
                None => {
                    debug!("watcher stream closed");
                    break;
                }
            },
            request = sync_rx.recv() => match request {
                Some(()) => Trigger::Sync,
                None => break,
            },
        };

        let value = match trigger {
            Trigger::Watch(ChangeEvent { error: Some(err), .. }) => Err(err),
            Trigger::Watch(event) => {
                debug!(path = ?event.path, op = ?event.op, "source changed; re-reading");
                read(&reader).await
            }
            Trigger::Sync => {
                debug!("sync requested; re-reading");
                read(&reader).await
            }
        };

        tokio::select! {
            _ = &mut close_rx => break,
            sent = value_tx.send(value) => {
                if sent.is_err() {
                    debug!("provider receiver dropped");
                    break;
                }
            }
        }
    }

    debug!("provider loop finished");
}

/// Reading parses files; keep it off the async workers.
async fn read<R: Reader>(reader: &Arc<Mutex<R>>) -> ReaderResult<R::Value> {
    let reader = Arc::clone(reader);
    match tokio::task::spawn_blocking(move || lock(&reader).read()).await {
        Ok(res) => res,
        Err(join_err) => Err(ComposeWatchError::Other(anyhow::anyhow!(
            "reader task failed: {join_err}"
        ))),
    }
}
