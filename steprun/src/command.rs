//! Command execution for `run_cmd` steps.
//!
//! The [`CommandRunner`] trait decouples the step semantics (dry-run reporting,
//! tokenizing, result shaping) from actually spawning processes. Tests use
//! scripted runners that return predetermined outcomes.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info, instrument, warn};

use crate::core::types::{CommandDetails, FailureKind, RUN_CMD, RunCmd, StepDetails, StepResult};
use crate::io::process::{spawn_isolated, wait_with_timeout};

/// How a command line is handed to the OS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandLine {
    /// Tokenized program + arguments, executed directly.
    Argv(Vec<String>),
    /// Raw string run by the platform shell.
    Shell(String),
}

/// Parameters for one live command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    pub line: CommandLine,
    pub workdir: PathBuf,
    /// Overlay on top of the inherited environment.
    pub env: BTreeMap<String, String>,
    pub timeout: Duration,
    pub output_limit_bytes: usize,
}

/// What happened to a live command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The process exited on its own. `exit_code` is `None` when a signal ended it.
    Completed {
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },
    /// The process outlived its timeout and was killed; output is partial.
    TimedOut { stdout: String, stderr: String },
    /// The program could not be started.
    SpawnFailed { message: String },
}

/// Abstraction over process execution backends.
pub trait CommandRunner {
    fn run(&self, request: &CommandRequest) -> Result<CommandOutcome>;
}

/// Runner that spawns real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    #[instrument(skip_all, fields(timeout_secs = request.timeout.as_secs()))]
    fn run(&self, request: &CommandRequest) -> Result<CommandOutcome> {
        let mut cmd = match &request.line {
            CommandLine::Argv(argv) => {
                let Some((program, args)) = argv.split_first() else {
                    return Ok(CommandOutcome::SpawnFailed {
                        message: "empty argv".to_string(),
                    });
                };
                let mut cmd = Command::new(program);
                cmd.args(args);
                cmd
            }
            CommandLine::Shell(raw) => shell_command(raw),
        };
        cmd.current_dir(&request.workdir).envs(&request.env);

        let child = match spawn_isolated(cmd) {
            Ok(child) => child,
            Err(err) => {
                warn!(err = %err, "failed to spawn command");
                return Ok(CommandOutcome::SpawnFailed {
                    message: err.to_string(),
                });
            }
        };

        let output = wait_with_timeout(child, request.timeout, request.output_limit_bytes)?;
        if output.timed_out {
            return Ok(CommandOutcome::TimedOut {
                stdout: output.stdout_text(),
                stderr: output.stderr_text(),
            });
        }
        Ok(CommandOutcome::Completed {
            exit_code: output.status.code(),
            stdout: output.stdout_text(),
            stderr: output.stderr_text(),
        })
    }
}

#[cfg(unix)]
fn shell_command(raw: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(raw);
    cmd
}

#[cfg(windows)]
fn shell_command(raw: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(raw);
    cmd
}

/// Where and how commands run.
#[derive(Debug, Clone)]
pub struct CommandContext<'a> {
    pub cwd: &'a Path,
    pub dry_run: bool,
    /// Used when the step has no `timeout`.
    pub default_timeout: Duration,
    pub output_limit_bytes: usize,
}

/// Execute (or, in dry-run mode, describe) a `run_cmd` step.
///
/// A completed command always reports `changed = true`, whatever its exit
/// status. Failures are results; only errors while waiting on or killing a
/// spawned process are returned as `Err`.
#[instrument(skip_all, fields(cmd = %step.cmd, shell = step.shell, dry_run = ctx.dry_run))]
pub fn run_cmd<R: CommandRunner>(
    step: &RunCmd,
    ctx: &CommandContext<'_>,
    runner: &R,
) -> Result<StepResult> {
    let timeout = step
        .timeout
        .map(Duration::from_secs)
        .unwrap_or(ctx.default_timeout);
    let details = StepDetails::Command(CommandDetails {
        cmd: step.cmd.clone(),
        shell: step.shell,
        cwd: ctx.cwd.to_path_buf(),
        timeout_secs: timeout.as_secs(),
        env: step.env.clone(),
        planned: ctx.dry_run,
    });

    if ctx.dry_run {
        debug!("dry run, command not spawned");
        return Ok(StepResult::success(RUN_CMD, false, details));
    }

    let line = match parse_command_line(&step.cmd, step.shell) {
        Ok(line) => line,
        Err(message) => {
            return Ok(StepResult::failure(
                RUN_CMD,
                FailureKind::InvalidStep,
                message,
                details,
            ));
        }
    };

    let request = CommandRequest {
        line,
        workdir: ctx.cwd.to_path_buf(),
        env: step.env.clone(),
        timeout,
        output_limit_bytes: ctx.output_limit_bytes,
    };
    info!("running command");

    let result = match runner.run(&request)? {
        CommandOutcome::Completed {
            exit_code,
            stdout,
            stderr,
        } => {
            let ok = exit_code == Some(0);
            if !ok {
                warn!(exit_code = ?exit_code, "command failed");
            }
            StepResult {
                kind: RUN_CMD.to_string(),
                ok,
                changed: true,
                exit_code,
                stdout,
                stderr,
                failure: (!ok).then_some(FailureKind::NonZeroExit),
                details,
            }
        }
        CommandOutcome::TimedOut { stdout, stderr } => {
            warn!(timeout_secs = timeout.as_secs(), "command timed out");
            StepResult {
                kind: RUN_CMD.to_string(),
                ok: false,
                changed: false,
                exit_code: None,
                stdout,
                stderr: format!("{stderr}\n[timeout after {}s]", timeout.as_secs()),
                failure: Some(FailureKind::Timeout),
                details,
            }
        }
        CommandOutcome::SpawnFailed { message } => StepResult::failure(
            RUN_CMD,
            FailureKind::SpawnFailed,
            format!("Failed to start command: {message}"),
            details,
        ),
    };
    Ok(result)
}

/// Split `raw` into an argv (shell-style quoting) or keep it whole for the shell.
fn parse_command_line(raw: &str, shell: bool) -> Result<CommandLine, String> {
    if raw.trim().is_empty() {
        return Err("Empty command.".to_string());
    }
    if shell {
        return Ok(CommandLine::Shell(raw.to_string()));
    }
    match shlex::split(raw) {
        Some(argv) if !argv.is_empty() => Ok(CommandLine::Argv(argv)),
        Some(_) => Err("Empty command.".to_string()),
        None => Err("Could not parse command line (unbalanced quotes?).".to_string()),
    }
}
