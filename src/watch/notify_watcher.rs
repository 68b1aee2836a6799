// src/watch/notify_watcher.rs

use std::path::Path;
use std::sync::Mutex;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::debug;

use crate::errors::{ComposeWatchError, Result};
use crate::lock;
use crate::types::{ChangeEvent, Operation};
use crate::watch::PathWatcher;

/// [`PathWatcher`] backed by the platform's recommended `notify` watcher.
///
/// Every registered path is watched non-recursively. Closing drops the inner
/// watcher, which drops the notify callback and with it the only sender of
/// the event stream.
pub struct NotifyWatcher {
    inner: Mutex<Option<RecommendedWatcher>>,
    events: Mutex<Option<mpsc::UnboundedReceiver<ChangeEvent>>>,
}

impl std::fmt::Debug for NotifyWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyWatcher").finish_non_exhaustive()
    }
}

impl NotifyWatcher {
    pub fn new() -> Result<Self> {
        // Channel from the blocking notify callback into the async world.
        let (event_tx, event_rx) = mpsc::unbounded_channel::<ChangeEvent>();

        let watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let Some(op) = Operation::from_event_kind(&event.kind) else {
                        return;
                    };
                    for path in event.paths {
                        if event_tx.send(ChangeEvent::new(path, op)).is_err() {
                            // Receiver gone; nobody is listening anymore.
                            return;
                        }
                    }
                }
                Err(err) => {
                    let _ = event_tx.send(ChangeEvent::failed(err.into()));
                }
            },
            Config::default(),
        )?;

        Ok(Self {
            inner: Mutex::new(Some(watcher)),
            events: Mutex::new(Some(event_rx)),
        })
    }

    fn with_watcher<T>(
        &self,
        f: impl FnOnce(&mut RecommendedWatcher) -> notify::Result<T>,
    ) -> Result<T> {
        let mut guard = lock(&self.inner);
        let watcher = guard
            .as_mut()
            .ok_or(ComposeWatchError::Closed("notify watcher"))?;
        Ok(f(watcher)?)
    }
}

impl PathWatcher for NotifyWatcher {
    fn add_path(&self, path: &Path) -> Result<()> {
        debug!(?path, "watching path");
        self.with_watcher(|w| w.watch(path, RecursiveMode::NonRecursive))
    }

    fn remove_path(&self, path: &Path) -> Result<()> {
        debug!(?path, "unwatching path");
        match self.with_watcher(|w| w.unwatch(path)) {
            // The backend drops watches of deleted directories on its own;
            // depending on timing that shows up as "not found" or as an OS
            // error for a path that no longer exists.
            Err(ComposeWatchError::Watch(err))
                if matches!(err.kind, notify::ErrorKind::WatchNotFound)
                    || std::fs::symlink_metadata(path).is_err() =>
            {
                debug!(?path, error = %err, "watch already gone");
                Ok(())
            }
            other => other,
        }
    }

    fn close(&self) -> Result<()> {
        if lock(&self.inner).take().is_some() {
            debug!("notify watcher closed");
        }
        Ok(())
    }

    fn take_events(&self) -> Option<mpsc::UnboundedReceiver<ChangeEvent>> {
        lock(&self.events).take()
    }
}
