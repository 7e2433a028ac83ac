//! Plan loading: JSON step lists validated against `schemas/plan.schema.json`.
//!
//! A plan is either a bare array of steps or an object `{"steps": [...]}`.
//! Steps whose `type` matches no known kind decode as [`Step::Unknown`] so the
//! dispatcher can report them without aborting the load.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use jsonschema::Draft;
use serde_json::Value;
use tracing::debug;

use crate::core::types::{KNOWN_KINDS, Step};

const PLAN_SCHEMA: &str = include_str!("../../schemas/plan.schema.json");

/// Read, validate and decode the plan at `path`.
pub fn load_plan(path: &Path) -> Result<Vec<Step>> {
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    parse_plan(&raw).with_context(|| format!("load plan {}", path.display()))
}

/// Validate and decode a plan document.
pub fn parse_plan(raw: &str) -> Result<Vec<Step>> {
    let document: Value = serde_json::from_str(raw).context("parse plan json")?;
    let document = match document {
        Value::Array(steps) => serde_json::json!({ "steps": steps }),
        other => other,
    };
    validate_schema(&document)?;

    let entries = document
        .get("steps")
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow!("plan is missing a `steps` array"))?;
    let steps = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| decode_step(index, entry))
        .collect::<Result<Vec<_>>>()?;
    debug!(steps = steps.len(), "decoded plan");
    Ok(steps)
}

fn decode_step(index: usize, entry: &Value) -> Result<Step> {
    let kind = entry
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("step {index} is missing a string `type`"))?;
    if !KNOWN_KINDS.contains(&kind) {
        return Ok(Step::Unknown {
            kind: kind.to_string(),
        });
    }
    serde_json::from_value(entry.clone()).with_context(|| format!("decode step {index} ({kind})"))
}

/// Validate a plan document against the bundled JSON Schema (Draft 2020-12).
fn validate_schema(instance: &Value) -> Result<()> {
    let schema: Value = serde_json::from_str(PLAN_SCHEMA).context("parse plan schema")?;
    let compiled = jsonschema::options()
        .with_draft(Draft::Draft202012)
        .build(&schema)
        .context("compile plan schema")?;
    let messages: Vec<String> = compiled
        .iter_errors(instance)
        .map(|err| err.to_string())
        .collect();
    if !messages.is_empty() {
        bail!("plan schema validation failed:\n- {}", messages.join("\n- "));
    }
    Ok(())
}
