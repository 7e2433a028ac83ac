//! Test-only helpers for constructing steps, scripting command outcomes and
//! managing scratch workspaces.

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tempfile::TempDir;

use crate::command::{CommandOutcome, CommandRequest, CommandRunner};
use crate::core::types::{PatchFile, RunCmd, Step, WriteFile};

/// `write_file` step with overwrite enabled.
pub fn write(path: &str, content: &str) -> Step {
    Step::WriteFile(WriteFile {
        path: PathBuf::from(path),
        content: content.to_string(),
        overwrite: true,
    })
}

/// `write_file` step that refuses to replace differing content.
pub fn write_no_overwrite(path: &str, content: &str) -> Step {
    Step::WriteFile(WriteFile {
        path: PathBuf::from(path),
        content: content.to_string(),
        overwrite: false,
    })
}

/// `patch_file` step replacing every occurrence.
pub fn patch(path: &str, find: &str, replace: &str) -> Step {
    patch_n(path, find, replace, 0)
}

/// `patch_file` step replacing at most `count` occurrences.
pub fn patch_n(path: &str, find: &str, replace: &str, count: usize) -> Step {
    Step::PatchFile(PatchFile {
        path: PathBuf::from(path),
        find: Some(find.to_string()),
        replace: replace.to_string(),
        count,
    })
}

/// Tokenized `run_cmd` step with default timeout and no env overlay.
pub fn cmd(cmd: &str) -> Step {
    Step::RunCmd(RunCmd {
        cmd: cmd.to_string(),
        shell: false,
        env: BTreeMap::new(),
        timeout: None,
    })
}

/// Shell-mode `run_cmd` step with an explicit timeout in seconds.
pub fn shell_cmd(cmd: &str, timeout_secs: u64) -> Step {
    Step::RunCmd(RunCmd {
        cmd: cmd.to_string(),
        shell: true,
        env: BTreeMap::new(),
        timeout: Some(timeout_secs),
    })
}

pub fn unknown(kind: &str) -> Step {
    Step::Unknown {
        kind: kind.to_string(),
    }
}

/// Command runner that replays queued outcomes and records every request.
pub struct ScriptedRunner {
    outcomes: RefCell<VecDeque<CommandOutcome>>,
    requests: RefCell<Vec<CommandRequest>>,
}

impl ScriptedRunner {
    pub fn new(outcomes: Vec<CommandOutcome>) -> Self {
        Self {
            outcomes: RefCell::new(outcomes.into()),
            requests: RefCell::new(Vec::new()),
        }
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<CommandRequest> {
        self.requests.borrow().clone()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, request: &CommandRequest) -> Result<CommandOutcome> {
        self.requests.borrow_mut().push(request.clone());
        self.outcomes
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow!("no scripted command outcome left"))
    }
}

/// Scratch working directory removed on drop.
pub struct TempWorkspace {
    dir: TempDir,
}

impl TempWorkspace {
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir().context("create temp workspace")?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn seed(&self, rel: &str, contents: &str) -> Result<()> {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))
    }

    pub fn read(&self, rel: &str) -> Result<String> {
        let path = self.dir.path().join(rel);
        fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.dir.path().join(rel).exists()
    }
}
