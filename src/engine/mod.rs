// src/engine/mod.rs

//! Orchestration engine.
//!
//! [`ComposeController`] owns the long-running loop of the binary: it reacts
//! to compose file changes by re-targeting the recursive listener, and to
//! source changes by asking the backend to rebuild.

pub mod controller;

pub use controller::ComposeController;
