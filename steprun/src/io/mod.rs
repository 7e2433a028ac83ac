//! I/O helpers for the step engine.

pub mod config;
pub mod fs;
pub mod manifest;
pub mod plan;
pub mod process;
