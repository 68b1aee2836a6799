// src/exec/mod.rs

//! Process execution layer.
//!
//! The controller never spawns processes directly; it asks a
//! [`RebuildBackend`] to rebuild and restart the compose project. The
//! production [`ComposeBackend`] drives `docker-compose` through a
//! [`crate::compose::Commander`].

pub mod backend;

pub use backend::{ComposeBackend, RebuildBackend};
