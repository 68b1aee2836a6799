// src/throttle.rs

//! Debounce-to-quiescence over a channel.
//!
//! One invocation is one *wait-then-fire* cycle: wait for a first value, keep
//! replacing it while new values arrive within `window`, and deliver the last
//! one once the source has been quiet for the full window. If the source
//! closes first, nothing is delivered and the cycle reports closure.
//!
//! Callers observe a stream continuously by running one cycle per loop
//! iteration. [`Throttle`] keeps the source (and any candidate already pulled
//! from it) between cycles, so values arriving while nobody is inside a cycle
//! stay buffered in the channel instead of being lost.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::trace;

/// Reusable single-shot throttler bound to one source.
#[derive(Debug)]
pub struct Throttle<T> {
    window: Duration,
    source: mpsc::Receiver<T>,
    candidate: Option<T>,
}

impl<T> Throttle<T> {
    pub fn new(window: Duration, source: mpsc::Receiver<T>) -> Self {
        Self {
            window,
            source,
            candidate: None,
        }
    }

    /// Run one wait-then-fire cycle.
    ///
    /// Returns the last value received before `window` of silence, or `None`
    /// if the source closed before that happened.
    ///
    /// Cancel safe: dropping the future keeps a candidate that was already
    /// received; the next call picks it up and starts a fresh window.
    pub async fn next(&mut self) -> Option<T> {
        if self.candidate.is_none() {
            self.candidate = Some(self.source.recv().await?);
        }

        loop {
            match tokio::time::timeout(self.window, self.source.recv()).await {
                Ok(Some(value)) => {
                    trace!("throttle: newer value supersedes candidate");
                    self.candidate = Some(value);
                }
                Ok(None) => {
                    // closed mid-wait: the pending candidate is dropped
                    self.candidate = None;
                    return None;
                }
                Err(_elapsed) => return self.candidate.take(),
            }
        }
    }
}

/// Single-use derived stream: runs exactly one cycle over `source` in a
/// background task.
///
/// The returned receiver yields at most one value and then closes. If the
/// source closes before a quiet window elapses it closes without a value.
pub fn throttle<T: Send + 'static>(window: Duration, source: mpsc::Receiver<T>) -> mpsc::Receiver<T> {
    let (tx, rx) = mpsc::channel(1);
    tokio::spawn(async move {
        let mut throttle = Throttle::new(window, source);
        if let Some(value) = throttle.next().await {
            let _ = tx.send(value).await;
        }
    });
    rx
}
