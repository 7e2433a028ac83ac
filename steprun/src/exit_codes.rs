//! Stable exit codes for the `steprun` CLI.

/// Every step reported `ok`.
pub const OK: i32 = 0;
/// The plan or config was invalid, or the run hit an unexpected fault.
pub const INVALID: i32 = 1;
/// A file operation failed and the remaining steps were skipped.
pub const HALTED: i32 = 2;
/// The run completed but at least one command or unknown step failed.
pub const STEP_FAILED: i32 = 3;
