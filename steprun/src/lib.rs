//! Declarative step-execution engine.
//!
//! Applies an ordered list of steps (write a file, patch a file by literal
//! find/replace, run an external command) to a working directory, or reports
//! what would happen in dry-run mode. The architecture enforces a strict
//! separation:
//!
//! - **[`core`]**: Pure, deterministic logic (step/result types, diffing,
//!   replacement). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting helpers (filesystem, process execution, config,
//!   plan and manifest files).
//!
//! Orchestration modules ([`mutator`], [`command`], [`dispatch`]) combine core
//! logic with I/O to implement each step kind and the run-level halt policy.

pub mod command;
pub mod core;
pub mod dispatch;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod mutator;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use crate::core::types::{FailureKind, Run, RunStatus, Step, StepResult};
pub use crate::dispatch::{Dispatcher, run_steps};
