//! Deterministic, pure logic shared by the step engine.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data and return deterministic outputs suitable for tests.

pub mod diff;
pub mod replace;
pub mod types;
