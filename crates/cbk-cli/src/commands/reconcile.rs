//! `cbk reconcile`

use anyhow::{bail, Context, Result};
use cbk_config::{CapbookConfig, ConfigMode, UnusedKeyPolicy};
use cbk_reconcile::{normalize, reconcile_input, RawReconcileInput, ReconcileSummary};
use tracing::{info, warn};

use super::{load_bundle, load_config, write_json};

fn print_level(label: &str, s: &ReconcileSummary) {
    println!(
        "{label}_passed={} {label}_checks={} {label}_failed={}",
        s.passed(),
        s.total_checks(),
        s.failed_checks()
    );
    for f in s.failures() {
        println!(
            "  failure team={} year={} check={} expected={} actual={} delta={}",
            f.team_code, f.salary_year, f.check_name, f.expected, f.actual, f.delta
        );
    }
}

pub fn run_reconcile(
    input: &str,
    partitions: Option<usize>,
    config_paths: &[String],
    out: Option<&str>,
) -> Result<()> {
    let configured = if config_paths.is_empty() {
        1
    } else {
        let loaded = load_config(config_paths, ConfigMode::Reconcile, UnusedKeyPolicy::Warn)?;
        println!("config_hash={}", loaded.config_hash);
        CapbookConfig::from_loaded(&loaded)?.reconcile.partitions
    };
    let partitions = partitions.unwrap_or(configured).max(1);

    let bundle = load_bundle(input)?;
    let raw: RawReconcileInput =
        serde_json::from_value(bundle).context("input bundle does not match the reconcile schema")?;
    let normalized = normalize(&raw).context("CONTRACT_ERROR")?;
    let run = reconcile_input(&normalized, partitions).context("CONTRACT_ERROR")?;

    print_level("bucket", &run.buckets);
    print_level("drilldown", &run.drilldowns);
    println!("orphan_drilldown_keys={}", run.orphan_drilldown_keys);
    println!("skipped_rows={}", run.skipped_rows());
    println!("reconcile_passed={}", run.passed());

    if run.skipped_rows() > 0 {
        warn!(skipped_rows = run.skipped_rows(), "malformed rows were skipped");
    }

    if let Some(path) = out {
        write_json(path, &run.report())?;
        info!(path, "reconcile report written");
    }

    if !run.passed() {
        bail!(
            "RECONCILE_FAILED bucket_failed={} drilldown_failed={}",
            run.buckets.failed_checks(),
            run.drilldowns.failed_checks()
        );
    }
    Ok(())
}
