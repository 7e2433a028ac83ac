//! File mutations: whole-file writes and literal find/replace patches.
//!
//! Both operations read the current content first and report whether the
//! target would change. In dry-run mode the read is the only filesystem access.

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{debug, instrument, warn};

use crate::core::diff::unified_diff_with_context;
use crate::core::replace::replace_literal;
use crate::core::types::{
    FailureKind, PATCH_FILE, PatchDetails, PatchFile, StepDetails, StepResult, TargetDetails,
    WRITE_FILE, WriteDetails, WriteFile,
};
use crate::io::fs::{read_text_if_exists, write_text};

/// Where and how file steps are applied.
#[derive(Debug, Clone)]
pub struct FileContext<'a> {
    /// Relative step paths resolve against this directory.
    pub cwd: &'a Path,
    /// Report outcomes without writing.
    pub dry_run: bool,
    pub diff_context_lines: usize,
}

impl FileContext<'_> {
    fn resolve(&self, path: &Path) -> PathBuf {
        self.cwd.join(path)
    }

    fn preview(&self, before: &str, after: &str, path: &Path) -> String {
        unified_diff_with_context(
            before,
            after,
            &path.display().to_string(),
            self.diff_context_lines,
        )
    }
}

/// Write `step.content` to `step.path`.
///
/// Conflicts (existing file, `overwrite = false`, different content) are
/// reported as a failed result without touching the file.
#[instrument(skip_all, fields(path = %step.path.display(), dry_run = ctx.dry_run))]
pub fn write_file(step: &WriteFile, ctx: &FileContext<'_>) -> Result<StepResult> {
    let path = ctx.resolve(&step.path);
    let existing = read_text_if_exists(&path)?;
    let exists_before = existing.is_some();
    let before = existing.unwrap_or_default();

    if exists_before && !step.overwrite && before != step.content {
        warn!(path = %path.display(), "refusing to overwrite existing file");
        return Ok(StepResult::failure(
            WRITE_FILE,
            FailureKind::Conflict,
            "File exists and overwrite=false.",
            StepDetails::Target(TargetDetails { path }),
        ));
    }

    let changed = before != step.content;
    let preview_diff = changed.then(|| ctx.preview(&before, &step.content, &path));

    if changed && !ctx.dry_run {
        write_text(&path, &step.content)?;
    }
    debug!(changed, exists_before, "write_file evaluated");

    Ok(StepResult::success(
        WRITE_FILE,
        changed,
        StepDetails::Write(WriteDetails {
            path,
            bytes: step.content.len(),
            exists_before,
            preview_diff,
        }),
    ))
}

/// Replace literal occurrences of `step.find` in an existing file.
#[instrument(skip_all, fields(path = %step.path.display(), count = step.count, dry_run = ctx.dry_run))]
pub fn patch_file(step: &PatchFile, ctx: &FileContext<'_>) -> Result<StepResult> {
    let path = ctx.resolve(&step.path);

    let Some(find) = step.find.as_deref() else {
        return Ok(StepResult::failure(
            PATCH_FILE,
            FailureKind::InvalidStep,
            "Missing 'find' value.",
            StepDetails::Target(TargetDetails { path }),
        ));
    };

    let Some(before) = read_text_if_exists(&path)? else {
        warn!(path = %path.display(), "patch target does not exist");
        return Ok(StepResult::failure(
            PATCH_FILE,
            FailureKind::NotFound,
            "File not found.",
            StepDetails::Target(TargetDetails { path }),
        ));
    };

    let patched = replace_literal(&before, find, &step.replace, step.count);
    let changed = patched.text != before;
    let replacements = if changed { patched.replacements } else { 0 };
    let preview_diff = changed.then(|| ctx.preview(&before, &patched.text, &path));

    if changed && !ctx.dry_run {
        write_text(&path, &patched.text)?;
    }
    debug!(changed, replacements, "patch_file evaluated");

    Ok(StepResult::success(
        PATCH_FILE,
        changed,
        StepDetails::Patch(PatchDetails {
            path,
            replacements,
            preview_diff,
        }),
    ))
}
