use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use compose_watcher::errors::{ComposeWatchError, Result};
use compose_watcher::provider::Reader;

#[derive(Debug)]
struct Script<V> {
    reads: VecDeque<Result<V>>,
    added: Vec<PathBuf>,
    reads_done: usize,
    closed: bool,
    fail_add: bool,
    fail_close: bool,
}

/// Scripted [`Reader`]: each `read` pops the next prepared result.
///
/// Clones share state, so a test keeps one clone for inspection after handing
/// the other to a provider.
#[derive(Debug)]
pub struct FakeReader<V> {
    script: Arc<Mutex<Script<V>>>,
}

impl<V> Clone for FakeReader<V> {
    fn clone(&self) -> Self {
        Self {
            script: Arc::clone(&self.script),
        }
    }
}

impl<V> Default for FakeReader<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> FakeReader<V> {
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(Script {
                reads: VecDeque::new(),
                added: Vec::new(),
                reads_done: 0,
                closed: false,
                fail_add: false,
                fail_close: false,
            })),
        }
    }

    pub fn push_read(&self, result: Result<V>) -> &Self {
        self.script.lock().unwrap().reads.push_back(result);
        self
    }

    pub fn fail_add(&self) -> &Self {
        self.script.lock().unwrap().fail_add = true;
        self
    }

    pub fn fail_close(&self) -> &Self {
        self.script.lock().unwrap().fail_close = true;
        self
    }

    pub fn added(&self) -> Vec<PathBuf> {
        self.script.lock().unwrap().added.clone()
    }

    pub fn reads_done(&self) -> usize {
        self.script.lock().unwrap().reads_done
    }

    pub fn is_closed(&self) -> bool {
        self.script.lock().unwrap().closed
    }
}

impl<V: Send + 'static> Reader for FakeReader<V> {
    type Value = V;

    fn add(&mut self, path: &Path) -> Result<()> {
        let mut script = self.script.lock().unwrap();
        if script.fail_add {
            return Err(ComposeWatchError::ConfigError(format!(
                "fake reader refuses {path:?}"
            )));
        }
        script.added.push(path.to_path_buf());
        Ok(())
    }

    fn read(&mut self) -> Result<V> {
        let mut script = self.script.lock().unwrap();
        script.reads_done += 1;
        script
            .reads
            .pop_front()
            .unwrap_or(Err(ComposeWatchError::Closed("fake reader script")))
    }

    fn close(&mut self) -> Result<()> {
        let mut script = self.script.lock().unwrap();
        script.closed = true;
        if script.fail_close {
            return Err(ComposeWatchError::ConfigError("fake reader close failed".into()));
        }
        Ok(())
    }
}
