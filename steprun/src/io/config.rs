//! Engine configuration, optionally stored as TOML (e.g. `steprun.toml`).

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::diff::DEFAULT_CONTEXT_LINES;

/// Engine configuration (TOML).
///
/// Missing fields default to the values the engine uses without a config file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RunnerConfig {
    /// `run_cmd` timeout in seconds when a step does not set `timeout`.
    pub default_timeout_secs: u64,

    /// Keep at most this many bytes of each of stdout/stderr per command.
    pub output_limit_bytes: usize,

    /// Context lines around each hunk of a diff preview.
    pub diff_context_lines: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            default_timeout_secs: 600,
            output_limit_bytes: 1_000_000,
            diff_context_lines: DEFAULT_CONTEXT_LINES,
        }
    }
}

impl RunnerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.default_timeout_secs == 0 {
            return Err(anyhow!("default_timeout_secs must be > 0"));
        }
        if self.output_limit_bytes == 0 {
            return Err(anyhow!("output_limit_bytes must be > 0"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `RunnerConfig::default()`.
pub fn load_config(path: &Path) -> Result<RunnerConfig> {
    if !path.exists() {
        let cfg = RunnerConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: RunnerConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}
