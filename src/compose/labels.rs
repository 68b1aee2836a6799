// src/compose/labels.rs

//! Translation from compose services to the directories worth watching.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use crate::compose::reader::{ComposeService, ComposeServices};

/// Service label overriding the directory to watch.
pub const PATH_LABEL: &str = "docker-compose-watcher.path";

/// A service reduced to what the controller needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchedService {
    pub name: String,
    pub directory: PathBuf,
    /// Watched path relative to `directory`; `None` means nothing to watch.
    pub path: Option<String>,
}

impl WatchedService {
    /// The `docker-compose-watcher.path` label wins over the build path.
    /// Empty values count as unset.
    pub fn from_service(service: &ComposeService) -> Self {
        let set = |p: &&String| !p.is_empty();
        let path = service
            .labels
            .get(PATH_LABEL)
            .filter(set)
            .or(service.build_path.as_ref().filter(set))
            .cloned();
        Self {
            name: service.name.clone(),
            directory: service.directory.clone(),
            path,
        }
    }

    /// Absolute-or-relative directory to watch, if any.
    pub fn watch_dir(&self) -> Option<PathBuf> {
        self.path.as_ref().map(|p| self.directory.join(p))
    }
}

pub fn translate(services: &ComposeServices) -> BTreeMap<String, WatchedService> {
    services
        .iter()
        .map(|(name, s)| (name.clone(), WatchedService::from_service(s)))
        .collect()
}

/// Distinct directories to watch, in order.
pub fn watch_roots(services: &BTreeMap<String, WatchedService>) -> Vec<PathBuf> {
    services
        .values()
        .filter_map(WatchedService::watch_dir)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
