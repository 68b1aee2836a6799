#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::sync::mpsc;

use compose_watcher::types::ChangeEvent;

pub use compose_watcher_test_utils::{init_tracing, wait_until, with_timeout};

/// Receive events until one for `path` arrives; panics after 5 seconds.
pub async fn recv_event_for(rx: &mut mpsc::Receiver<ChangeEvent>, path: &Path) -> ChangeEvent {
    with_timeout(async {
        loop {
            let event = rx.recv().await.expect("event stream closed early");
            if event.path == path {
                return event;
            }
        }
    })
    .await
}

/// Assert nothing shows up on `rx` for `quiet`.
pub async fn assert_quiet<T: std::fmt::Debug>(rx: &mut mpsc::Receiver<T>, quiet: Duration) {
    if let Ok(Some(v)) = tokio::time::timeout(quiet, rx.recv()).await {
        panic!("expected no value, got {v:?}");
    }
}

/// Canonical temp directory, so event paths compare equal on every platform.
pub fn canonical_tempdir() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("create tempdir");
    let path = dir.path().canonicalize().expect("canonicalize tempdir");
    (dir, path)
}
