// src/compose/mod.rs

//! Docker Compose collaborators.
//!
//! - [`reader`] turns compose files into [`ComposeService`] records and plugs
//!   into the change provider as its [`crate::provider::Reader`].
//! - [`labels`] reduces services to the directories that should be watched.
//! - [`commander`] builds `docker-compose build` / `up` invocations.

pub mod commander;
pub mod labels;
pub mod reader;

pub use commander::{BuildOptions, Commander, CommanderOptions, ComposeLogLevel, UpOptions};
pub use labels::{translate, watch_roots, WatchedService, PATH_LABEL};
pub use reader::{parse_compose, ComposeReader, ComposeService, ComposeServices};
