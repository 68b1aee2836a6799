use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use compose_watcher::errors::{ComposeWatchError, Result};
use compose_watcher::exec::RebuildBackend;

/// A fake backend that:
/// - counts rebuilds and shutdowns
/// - optionally fails every rebuild, to exercise error paths.
#[derive(Debug, Clone, Default)]
pub struct FakeBackend {
    rebuilds: Arc<AtomicUsize>,
    shutdowns: Arc<AtomicUsize>,
    fail: Arc<AtomicBool>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rebuilds(&self) -> usize {
        self.rebuilds.load(Ordering::SeqCst)
    }

    pub fn shutdowns(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl RebuildBackend for FakeBackend {
    fn rebuild_and_restart(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let rebuilds = Arc::clone(&self.rebuilds);
        let fail = self.fail.load(Ordering::SeqCst);

        Box::pin(async move {
            rebuilds.fetch_add(1, Ordering::SeqCst);
            if fail {
                return Err(ComposeWatchError::ConfigError("fake rebuild failed".into()));
            }
            Ok(())
        })
    }

    fn shutdown(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let shutdowns = Arc::clone(&self.shutdowns);
        Box::pin(async move {
            shutdowns.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }
}
