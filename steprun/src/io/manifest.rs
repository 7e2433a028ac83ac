//! Run manifests: a JSON record of one run, written by callers that persist runs.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::core::types::{Run, RunStatus, StepResult};
use crate::io::fs::write_atomic;

#[derive(Debug, Clone, Serialize)]
pub struct RunManifest<'a> {
    pub status: RunStatus,
    pub dry_run: bool,
    pub cwd: PathBuf,
    /// Steps in the plan, including any skipped after a halt.
    pub planned_steps: usize,
    pub executed_steps: usize,
    pub results: &'a [StepResult],
}

impl<'a> RunManifest<'a> {
    pub fn new(run: &'a Run, cwd: &Path, dry_run: bool, planned_steps: usize) -> Self {
        Self {
            status: run.status,
            dry_run,
            cwd: cwd.to_path_buf(),
            planned_steps,
            executed_steps: run.results.len(),
            results: &run.results,
        }
    }
}

/// Serialize `manifest` to pretty-printed JSON with trailing newline and write it atomically.
pub fn write_manifest(path: &Path, manifest: &RunManifest<'_>) -> Result<()> {
    let mut payload = serde_json::to_string_pretty(manifest).context("serialize manifest")?;
    payload.push('\n');
    write_atomic(path, &payload)
}
