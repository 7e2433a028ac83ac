//! Helpers for running child processes with timeouts and bounded output.
//!
//! Children are placed in their own process group on Unix so a timeout kills
//! everything they spawned (shell pipelines, backgrounded jobs), not just the
//! direct child.

use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, instrument, warn};
use wait_timeout::ChildExt;

/// Captured child process output.
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub stdout_truncated: usize,
    pub stderr_truncated: usize,
    pub timed_out: bool,
}

impl CommandOutput {
    /// Lossy UTF-8 stdout followed by a truncation notice when bytes were dropped.
    pub fn stdout_text(&self) -> String {
        render_stream(&self.stdout, self.stdout_truncated, "stdout")
    }

    /// Lossy UTF-8 stderr followed by a truncation notice when bytes were dropped.
    pub fn stderr_text(&self) -> String {
        render_stream(&self.stderr, self.stderr_truncated, "stderr")
    }
}

fn render_stream(bytes: &[u8], truncated: usize, label: &str) -> String {
    let mut text = String::from_utf8_lossy(bytes).into_owned();
    if truncated > 0 {
        text.push_str(&format!("\n[{label} truncated {truncated} bytes]\n"));
    }
    text
}

/// Spawn `cmd` with piped output, null stdin, and (on Unix) a fresh process group.
///
/// Spawn failures are returned unwrapped so callers can tell "could not start"
/// apart from failures while the child is running.
pub fn spawn_isolated(mut cmd: Command) -> std::io::Result<Child> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }
    debug!("spawning child process");
    cmd.spawn()
}

/// Wait for `child` up to `timeout`, capturing stdout/stderr without risking pipe deadlocks.
///
/// Output is read concurrently while the child runs. `output_limit_bytes` bounds the amount of
/// stdout/stderr stored in memory (bytes beyond this are discarded while still draining the pipe).
/// On timeout the child's process group is killed and reaped before returning.
#[instrument(skip_all, fields(pid = child.id(), timeout_secs = timeout.as_secs(), output_limit_bytes))]
pub fn wait_with_timeout(
    mut child: Child,
    timeout: Duration,
    output_limit_bytes: usize,
) -> Result<CommandOutput> {
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("stdout was not piped"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("stderr was not piped"))?;

    let stdout_handle = thread::spawn(move || read_stream_limited(stdout, output_limit_bytes));
    let stderr_handle = thread::spawn(move || read_stream_limited(stderr, output_limit_bytes));

    let mut timed_out = false;
    let status = match child.wait_timeout(timeout).context("wait for command")? {
        Some(status) => status,
        None => {
            warn!(
                timeout_secs = timeout.as_secs(),
                "command timed out, killing"
            );
            timed_out = true;
            kill_process_tree(&mut child)?;
            child.wait().context("wait command after kill")?
        }
    };

    let (stdout, stdout_truncated) = join_output(stdout_handle).context("join stdout")?;
    let (stderr, stderr_truncated) = join_output(stderr_handle).context("join stderr")?;

    if stdout_truncated > 0 || stderr_truncated > 0 {
        warn!(stdout_truncated, stderr_truncated, "output truncated");
    }

    debug!(exit_code = ?status.code(), timed_out, "command finished");
    Ok(CommandOutput {
        status,
        stdout,
        stderr,
        stdout_truncated,
        stderr_truncated,
        timed_out,
    })
}

#[cfg(unix)]
fn kill_process_tree(child: &mut Child) -> Result<()> {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let pgid = Pid::from_raw(child.id() as i32);
    match killpg(pgid, Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(err) => {
            warn!(err = %err, "killpg failed, killing direct child only");
            child.kill().context("kill command")
        }
    }
}

#[cfg(not(unix))]
fn kill_process_tree(child: &mut Child) -> Result<()> {
    child.kill().context("kill command")
}

fn join_output(handle: thread::JoinHandle<Result<(Vec<u8>, usize)>>) -> Result<(Vec<u8>, usize)> {
    match handle.join() {
        Ok(result) => result,
        Err(_) => Err(anyhow!("output reader thread panicked")),
    }
}

fn read_stream_limited<R: Read>(mut reader: R, limit: usize) -> Result<(Vec<u8>, usize)> {
    let mut buf = Vec::new();
    let mut truncated = 0usize;
    let mut chunk = [0u8; 8192];

    loop {
        let n = reader.read(&mut chunk).context("read output")?;
        if n == 0 {
            break;
        }
        let remaining = limit.saturating_sub(buf.len());
        if remaining > 0 {
            let keep = n.min(remaining);
            buf.extend_from_slice(&chunk[..keep]);
            truncated += n.saturating_sub(keep);
        } else {
            truncated += n;
        }
    }

    Ok((buf, truncated))
}
