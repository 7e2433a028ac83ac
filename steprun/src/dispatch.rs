//! Orchestration for a single run over an ordered step list.
//!
//! Steps execute strictly in order because later steps routinely depend on
//! files earlier steps produced. A failed file operation halts the run; a
//! failed command or an unknown step kind is recorded and iteration continues.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info, instrument, warn};

use crate::command::{CommandContext, CommandRunner, ProcessRunner, run_cmd};
use crate::core::types::{FailureKind, Run, RunStatus, Step, StepDetails, StepResult};
use crate::io::config::RunnerConfig;
use crate::mutator::{FileContext, patch_file, write_file};

/// Lifecycle of one dispatcher invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Running,
    Finished(RunStatus),
}

/// Applies step lists to a working directory.
#[derive(Debug, Clone)]
pub struct Dispatcher<R> {
    config: RunnerConfig,
    runner: R,
}

impl Dispatcher<ProcessRunner> {
    /// Dispatcher that spawns real processes for `run_cmd` steps.
    pub fn with_config(config: RunnerConfig) -> Self {
        Self::new(config, ProcessRunner)
    }
}

impl<R: CommandRunner> Dispatcher<R> {
    pub fn new(config: RunnerConfig, runner: R) -> Self {
        Self { config, runner }
    }

    /// Run `steps` against `cwd`, or only report what would happen when `dry_run` is set.
    ///
    /// Expected failures (conflict, missing file, non-zero exit, timeout,
    /// unknown kind) are results. An `Err` means an unexpected fault (e.g.
    /// permission denied) and the run must be treated as failed outright.
    #[instrument(skip_all, fields(steps = steps.len(), cwd = %cwd.display(), dry_run))]
    pub fn run(&self, steps: &[Step], cwd: &Path, dry_run: bool) -> Result<Run> {
        let file_ctx = FileContext {
            cwd,
            dry_run,
            diff_context_lines: self.config.diff_context_lines,
        };
        let cmd_ctx = CommandContext {
            cwd,
            dry_run,
            default_timeout: Duration::from_secs(self.config.default_timeout_secs),
            output_limit_bytes: self.config.output_limit_bytes,
        };

        let mut state = RunState::Running;
        let mut results = Vec::with_capacity(steps.len());
        debug!(?state, "starting run");

        for (index, step) in steps.iter().enumerate() {
            debug!(index, kind = step.kind(), "dispatching step");
            let result = match step {
                Step::WriteFile(write) => write_file(write, &file_ctx)?,
                Step::PatchFile(patch) => patch_file(patch, &file_ctx)?,
                Step::RunCmd(cmd) => run_cmd(cmd, &cmd_ctx, &self.runner)?,
                Step::Unknown { kind } => {
                    warn!(index, kind = %kind, "unknown step kind");
                    StepResult::failure(
                        kind,
                        FailureKind::UnknownStepKind,
                        "Unknown step type.",
                        StepDetails::Empty,
                    )
                }
            };

            let halt = step.is_file_op() && !result.ok;
            results.push(result);
            if halt {
                warn!(index, kind = step.kind(), "file operation failed, halting run");
                state = RunState::Finished(RunStatus::Halted);
                break;
            }
        }

        let status = match state {
            RunState::Finished(status) => status,
            RunState::Running => RunStatus::Completed,
        };
        info!(
            ?status,
            executed = results.len(),
            failed = results.iter().filter(|r| !r.ok).count(),
            "run finished"
        );
        Ok(Run { status, results })
    }
}

/// Run `steps` with the default configuration and real processes.
pub fn run_steps(steps: &[Step], cwd: &Path, dry_run: bool) -> Result<Run> {
    Dispatcher::with_config(RunnerConfig::default()).run(steps, cwd, dry_run)
}
