use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use compose_watcher::errors::{ComposeWatchError, Result};
use compose_watcher::types::ChangeEvent;
use compose_watcher::watch::{PathWatcher, WatcherFactory};
use tokio::sync::mpsc;

/// One call made on a [`FakeWatcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchCall {
    Add(PathBuf),
    Remove(PathBuf),
    Close,
}

#[derive(Debug, Default)]
struct Record {
    calls: Vec<WatchCall>,
    tx: Option<mpsc::UnboundedSender<ChangeEvent>>,
}

/// Shared journal of every fake watcher created from it.
///
/// Watchers are numbered in creation order; tests inspect their calls and
/// inject events through the log.
#[derive(Debug, Default)]
pub struct WatchLog {
    watchers: Mutex<Vec<Record>>,
    fail_add: Mutex<Vec<PathBuf>>,
    fail_close: AtomicBool,
}

impl WatchLog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Number of watchers created so far.
    pub fn created(&self) -> usize {
        self.watchers.lock().unwrap().len()
    }

    pub fn calls(&self, watcher: usize) -> Vec<WatchCall> {
        self.watchers
            .lock()
            .unwrap()
            .get(watcher)
            .map(|r| r.calls.clone())
            .unwrap_or_default()
    }

    /// Paths added to `watcher` and not removed again, in add order.
    pub fn watched(&self, watcher: usize) -> Vec<PathBuf> {
        let mut watched = Vec::new();
        for call in self.calls(watcher) {
            match call {
                WatchCall::Add(p) => watched.push(p),
                WatchCall::Remove(p) => watched.retain(|w| *w != p),
                WatchCall::Close => watched.clear(),
            }
        }
        watched
    }

    pub fn is_closed(&self, watcher: usize) -> bool {
        self.calls(watcher).contains(&WatchCall::Close)
    }

    /// Make every future `add_path` of `path` fail.
    pub fn fail_add(&self, path: impl Into<PathBuf>) {
        self.fail_add.lock().unwrap().push(path.into());
    }

    /// Make `close` fail on every watcher of this log. The call is still
    /// recorded and the stream still ends.
    pub fn fail_close(&self) {
        self.fail_close.store(true, Ordering::SeqCst);
    }

    /// Deliver `event` on the stream of `watcher`. Returns false if that
    /// stream is gone.
    pub fn emit(&self, watcher: usize, event: ChangeEvent) -> bool {
        let watchers = self.watchers.lock().unwrap();
        match watchers.get(watcher).and_then(|r| r.tx.as_ref()) {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        }
    }

    /// End the event stream of `watcher` without closing it.
    pub fn hang_up(&self, watcher: usize) {
        if let Some(r) = self.watchers.lock().unwrap().get_mut(watcher) {
            r.tx = None;
        }
    }

    fn register(&self, tx: mpsc::UnboundedSender<ChangeEvent>) -> usize {
        let mut watchers = self.watchers.lock().unwrap();
        watchers.push(Record {
            calls: Vec::new(),
            tx: Some(tx),
        });
        watchers.len() - 1
    }

    fn record(&self, watcher: usize, call: WatchCall) {
        if let Some(r) = self.watchers.lock().unwrap().get_mut(watcher) {
            if call == WatchCall::Close {
                r.tx = None;
            }
            r.calls.push(call);
        }
    }
}

/// In-memory [`PathWatcher`] recording every call into a [`WatchLog`].
#[derive(Debug)]
pub struct FakeWatcher {
    id: usize,
    log: Arc<WatchLog>,
    events: Mutex<Option<mpsc::UnboundedReceiver<ChangeEvent>>>,
}

impl FakeWatcher {
    pub fn new(log: &Arc<WatchLog>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = log.register(tx);
        Self {
            id,
            log: Arc::clone(log),
            events: Mutex::new(Some(rx)),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }
}

impl PathWatcher for FakeWatcher {
    fn add_path(&self, path: &Path) -> Result<()> {
        if self.log.fail_add.lock().unwrap().iter().any(|p| p == path) {
            return Err(ComposeWatchError::ConfigError(format!(
                "refusing to watch {path:?}"
            )));
        }
        self.log.record(self.id, WatchCall::Add(path.to_path_buf()));
        Ok(())
    }

    fn remove_path(&self, path: &Path) -> Result<()> {
        self.log.record(self.id, WatchCall::Remove(path.to_path_buf()));
        Ok(())
    }

    fn close(&self) -> Result<()> {
        self.log.record(self.id, WatchCall::Close);
        if self.log.fail_close.load(Ordering::SeqCst) {
            return Err(ComposeWatchError::Closed("fake watcher close failed"));
        }
        Ok(())
    }

    fn take_events(&self) -> Option<mpsc::UnboundedReceiver<ChangeEvent>> {
        self.events.lock().unwrap().take()
    }
}

/// Factory handing out [`FakeWatcher`]s that all record into `log`.
pub fn fake_factory(log: &Arc<WatchLog>) -> WatcherFactory {
    let log = Arc::clone(log);
    Arc::new(move || Ok(Box::new(FakeWatcher::new(&log)) as Box<dyn PathWatcher>))
}
