//! Command handler modules for the `cbk` binary.
//!
//! Shared helpers used by multiple commands live here.

pub mod derive;
pub mod reconcile;

use anyhow::{Context, Result};
use cbk_config::{report_unused_keys, ConfigMode, LoadedConfig, UnusedKeyPolicy};
use serde_json::Value;
use std::fs;
use tracing::warn;

/// Read an input bundle. A UTF-8 BOM is tolerated.
pub fn load_bundle(path: &str) -> Result<Value> {
    let bytes = fs::read(path).with_context(|| format!("read input bundle failed: {path}"))?;
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(&bytes);
    let raw = std::str::from_utf8(bytes).context("input bundle must be UTF-8 text")?;
    serde_json::from_str(raw.trim()).context("input bundle must contain valid JSON")
}

/// Load layered config and run the unused-key guard for `mode`.
pub fn load_config(paths: &[String], mode: ConfigMode, policy: UnusedKeyPolicy) -> Result<LoadedConfig> {
    let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
    let loaded = cbk_config::load_layered_yaml(&path_refs)?;

    let report = report_unused_keys(mode, &loaded.config_json, policy)?;
    if !report.is_clean() {
        warn!(
            mode = %report.mode,
            unused_leaf_keys = report.unused_leaf_pointers.len(),
            "CONFIG_UNUSED_KEYS"
        );
        for p in report.unused_leaf_pointers.iter().take(50) {
            warn!(unused = %p, "unused config key");
        }
    }
    Ok(loaded)
}

pub fn write_json(path: &str, value: &impl serde::Serialize) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("serialize report failed")?;
    fs::write(path, json).with_context(|| format!("write report failed: {path}"))
}
