// src/types.rs

use std::fmt;
use std::path::PathBuf;

use notify::event::{EventKind, ModifyKind};

use crate::errors::ComposeWatchError;

/// Kind of filesystem change reported for a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Write,
    Remove,
    Rename,
    AttributeChange,
}

impl Operation {
    /// Map a `notify` event kind onto an [`Operation`].
    ///
    /// Pure access events (open/read/close) are not changes and map to `None`.
    pub fn from_event_kind(kind: &EventKind) -> Option<Self> {
        match kind {
            EventKind::Access(_) => None,
            EventKind::Create(_) => Some(Operation::Create),
            EventKind::Remove(_) => Some(Operation::Remove),
            EventKind::Modify(ModifyKind::Name(_)) => Some(Operation::Rename),
            EventKind::Modify(ModifyKind::Metadata(_)) => Some(Operation::AttributeChange),
            EventKind::Modify(_) | EventKind::Any | EventKind::Other => Some(Operation::Write),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operation::Create => "create",
            Operation::Write => "write",
            Operation::Remove => "remove",
            Operation::Rename => "rename",
            Operation::AttributeChange => "chmod",
        };
        f.write_str(s)
    }
}

/// A single change notification.
///
/// Produced by path watchers and forwarded (normalized) by the recursive
/// listener. An event that only reports a watcher failure has an empty
/// `path` and no `op`. Consumers must check `error` before trusting the rest.
#[derive(Debug)]
pub struct ChangeEvent {
    pub path: PathBuf,
    pub op: Option<Operation>,
    pub error: Option<ComposeWatchError>,
}

impl ChangeEvent {
    pub fn new(path: impl Into<PathBuf>, op: Operation) -> Self {
        Self {
            path: path.into(),
            op: Some(op),
            error: None,
        }
    }

    pub fn failed(error: ComposeWatchError) -> Self {
        Self {
            path: PathBuf::new(),
            op: None,
            error: Some(error),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
