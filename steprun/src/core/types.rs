//! Shared deterministic types for step execution.
//!
//! These types define stable contracts between the dispatcher, the file
//! mutator, the command executor and callers. They carry no I/O and serialize
//! deterministically so results can be logged or persisted by callers.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const WRITE_FILE: &str = "write_file";
pub const PATCH_FILE: &str = "patch_file";
pub const RUN_CMD: &str = "run_cmd";

/// Step kinds that decode into a concrete [`Step`] variant.
pub const KNOWN_KINDS: [&str; 3] = [WRITE_FILE, PATCH_FILE, RUN_CMD];

/// One declarative unit of work within a run.
///
/// Plans are decoded with the `type` field as the tag. A kind that matches none
/// of the known variants is represented as [`Step::Unknown`] by the plan loader;
/// it never deserializes directly.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Step {
    WriteFile(WriteFile),
    PatchFile(PatchFile),
    RunCmd(RunCmd),
    #[serde(skip)]
    Unknown { kind: String },
}

impl Step {
    /// Wire name of the step kind (`write_file`, `patch_file`, ...).
    pub fn kind(&self) -> &str {
        match self {
            Step::WriteFile(_) => WRITE_FILE,
            Step::PatchFile(_) => PATCH_FILE,
            Step::RunCmd(_) => RUN_CMD,
            Step::Unknown { kind } => kind,
        }
    }

    /// File operations halt the run when they fail.
    pub fn is_file_op(&self) -> bool {
        matches!(self, Step::WriteFile(_) | Step::PatchFile(_))
    }
}

/// Write `content` to `path`, relative to the working directory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WriteFile {
    pub path: PathBuf,
    #[serde(default)]
    pub content: String,
    /// When false, an existing file with different content is a conflict.
    #[serde(default = "default_overwrite")]
    pub overwrite: bool,
}

/// Literal find/replace inside an existing file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PatchFile {
    pub path: PathBuf,
    /// Absent `find` is an invalid step; an empty one matches every char boundary.
    #[serde(default)]
    pub find: Option<String>,
    #[serde(default)]
    pub replace: String,
    /// Maximum replacements; `0` replaces every occurrence.
    #[serde(default)]
    pub count: usize,
}

/// External command invocation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RunCmd {
    pub cmd: String,
    /// Run through the platform shell instead of as a tokenized argv.
    #[serde(default)]
    pub shell: bool,
    /// Environment overlay merged onto the inherited environment.
    #[serde(default, deserialize_with = "env_overlay")]
    pub env: BTreeMap<String, String>,
    /// Timeout in seconds; falls back to the configured default.
    #[serde(default)]
    pub timeout: Option<u64>,
}

fn default_overwrite() -> bool {
    true
}

/// Accept scalar overlay values (`"1"`, `1`, `true`) and store their string form.
fn env_overlay<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, Value>> = Option::deserialize(deserializer)?;
    let mut env = BTreeMap::new();
    for (key, value) in raw.unwrap_or_default() {
        let text = match value {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            other => {
                return Err(serde::de::Error::custom(format!(
                    "env value for `{key}` must be a string, number or bool, got {other}"
                )));
            }
        };
        env.insert(key, text);
    }
    Ok(env)
}

/// Why a step reported `ok = false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// `write_file` hit an existing file with different content and overwrite disabled.
    Conflict,
    /// `patch_file` targeted a path that does not exist.
    NotFound,
    /// The step's own fields cannot be acted on (missing `find`, unparsable command).
    InvalidStep,
    /// The command outlived its timeout and was killed.
    Timeout,
    /// The command completed with a non-zero status or was terminated by a signal.
    NonZeroExit,
    /// The command's program could not be started.
    SpawnFailed,
    /// The step kind matched no known operation.
    UnknownStepKind,
}

/// Kind-specific details attached to a [`StepResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum StepDetails {
    Empty,
    Target(TargetDetails),
    Write(WriteDetails),
    Patch(PatchDetails),
    Command(CommandDetails),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetDetails {
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteDetails {
    pub path: PathBuf,
    /// UTF-8 byte length of the requested content.
    pub bytes: usize,
    pub exists_before: bool,
    /// Present only when the content changed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_diff: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchDetails {
    pub path: PathBuf,
    pub replacements: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_diff: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandDetails {
    pub cmd: String,
    pub shell: bool,
    pub cwd: PathBuf,
    pub timeout_secs: u64,
    pub env: BTreeMap<String, String>,
    /// True when the command was only reported (dry run), never spawned.
    pub planned: bool,
}

/// Outcome of a single step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepResult {
    #[serde(rename = "type")]
    pub kind: String,
    pub ok: bool,
    pub changed: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
    pub details: StepDetails,
}

impl StepResult {
    /// Successful result with empty output streams.
    pub fn success(kind: &str, changed: bool, details: StepDetails) -> Self {
        Self {
            kind: kind.to_string(),
            ok: true,
            changed,
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
            failure: None,
            details,
        }
    }

    /// Failed, unchanged result carrying `message` on stderr.
    pub fn failure(
        kind: &str,
        failure: FailureKind,
        message: impl Into<String>,
        details: StepDetails,
    ) -> Self {
        Self {
            kind: kind.to_string(),
            ok: false,
            changed: false,
            exit_code: None,
            stdout: String::new(),
            stderr: message.into(),
            failure: Some(failure),
            details,
        }
    }
}

/// Terminal state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Every step was processed.
    Completed,
    /// A file operation failed and the remaining steps were skipped.
    Halted,
}

/// Ordered results of one dispatcher invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Run {
    pub status: RunStatus,
    pub results: Vec<StepResult>,
}

impl Run {
    pub fn is_halted(&self) -> bool {
        self.status == RunStatus::Halted
    }

    /// True when every recorded step reported `ok`.
    pub fn all_ok(&self) -> bool {
        self.results.iter().all(|r| r.ok)
    }
}
