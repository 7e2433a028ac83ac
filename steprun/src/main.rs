//! Declarative step runner.
//!
//! Loads a JSON plan of steps and applies it to a working directory, printing
//! the per-step results as JSON. `--dry-run` reports what would change without
//! writing files or spawning commands.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use steprun::core::types::Run;
use steprun::dispatch::Dispatcher;
use steprun::exit_codes;
use steprun::io::config::{RunnerConfig, load_config};
use steprun::io::manifest::{RunManifest, write_manifest};
use steprun::io::plan::load_plan;
use steprun::logging;

#[derive(Parser)]
#[command(
    name = "steprun",
    version,
    about = "Apply declarative file and command steps to a working directory"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run every step of a plan in order (halting on a failed file operation).
    Apply {
        /// Plan file: a JSON array of steps or `{"steps": [...]}`.
        plan: PathBuf,
        /// Working directory step paths and commands resolve against.
        #[arg(long, default_value = ".")]
        cwd: PathBuf,
        /// Report what would happen without writing files or running commands.
        #[arg(long)]
        dry_run: bool,
        /// TOML config file (missing file means defaults).
        #[arg(long)]
        config: Option<PathBuf>,
        /// Also write a JSON manifest of the run to this path.
        #[arg(long)]
        manifest: Option<PathBuf>,
    },
    /// Check a plan against the schema and print its step count.
    Validate {
        plan: PathBuf,
    },
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Apply {
            plan,
            cwd,
            dry_run,
            config,
            manifest,
        } => cmd_apply(&plan, &cwd, dry_run, config.as_deref(), manifest.as_deref()),
        Command::Validate { plan } => cmd_validate(&plan),
    }
}

fn cmd_apply(
    plan_path: &Path,
    cwd: &Path,
    dry_run: bool,
    config_path: Option<&Path>,
    manifest_path: Option<&Path>,
) -> Result<i32> {
    let config = match config_path {
        Some(path) => load_config(path)?,
        None => RunnerConfig::default(),
    };
    let steps = load_plan(plan_path)?;
    if !cwd.is_dir() {
        anyhow::bail!("working directory {} does not exist", cwd.display());
    }

    let run = Dispatcher::with_config(config)
        .run(&steps, cwd, dry_run)
        .context("run aborted by unexpected fault")?;

    if let Some(path) = manifest_path {
        write_manifest(path, &RunManifest::new(&run, cwd, dry_run, steps.len()))?;
    }
    let payload = serde_json::to_string_pretty(&run).context("serialize run")?;
    println!("{payload}");
    Ok(exit_code_for(&run))
}

fn cmd_validate(plan_path: &Path) -> Result<i32> {
    let steps = load_plan(plan_path)?;
    println!("{}", steps.len());
    Ok(exit_codes::OK)
}

/// Map a finished run to a stable exit code.
fn exit_code_for(run: &Run) -> i32 {
    if run.is_halted() {
        exit_codes::HALTED
    } else if run.all_ok() {
        exit_codes::OK
    } else {
        exit_codes::STEP_FAILED
    }
}
