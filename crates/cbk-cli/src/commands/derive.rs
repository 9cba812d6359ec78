//! `cbk derive`

use anyhow::{Context, Result};
use cbk_config::{CapbookConfig, ConfigMode, UnusedKeyPolicy};
use cbk_ledger::ScenarioContext;
use cbk_reconcile::{normalize_snapshot, RawReconcileInput};
use cbk_scenario::{find_plan, normalize_scenario, project, ProjectionInputs, RawScenarioInput};
use tracing::warn;

use super::{load_bundle, load_config};

pub struct DeriveArgs {
    pub input: String,
    pub config_paths: Vec<String>,
    pub team: String,
    pub year: i32,
    pub plan: String,
    pub roster_count: u32,
    pub strict_config: bool,
}

pub fn run_derive(args: DeriveArgs) -> Result<()> {
    let policy = if args.strict_config {
        UnusedKeyPolicy::Fail
    } else {
        UnusedKeyPolicy::Warn
    };
    let loaded = load_config(&args.config_paths, ConfigMode::Derive, policy)?;
    let cfg = CapbookConfig::from_loaded(&loaded)?;
    let settings = cfg.projection_settings()?;
    let tables = cfg.year_tables(args.year)?;

    let bundle = load_bundle(&args.input)?;
    let raw_ledger: RawReconcileInput = serde_json::from_value(bundle.clone())
        .context("input bundle does not match the snapshot schema")?;
    let raw_scenario: RawScenarioInput = serde_json::from_value(bundle)
        .context("input bundle does not match the scenario schema")?;

    let (snapshot, snapshot_errors) = normalize_snapshot(&raw_ledger.snapshot);
    let scenario = normalize_scenario(&raw_scenario);
    let skipped = snapshot_errors.len() + scenario.skipped.len();
    if skipped > 0 {
        warn!(skipped_rows = skipped, "malformed rows were skipped");
    }

    let plan = find_plan(&scenario.plans, &args.plan)?;
    if !plan.active {
        warn!(plan_id = %plan.plan_id, name = %plan.name, "deriving an inactive plan");
    }
    let ctx = ScenarioContext::new(plan.plan_id, args.year);

    let projection = project(
        args.team.trim(),
        &ctx,
        args.roster_count,
        ProjectionInputs {
            snapshot: &snapshot,
            journal: &scenario.journal,
            outputs: &scenario.outputs,
        },
        &settings,
        &tables,
    )?;

    println!("config_hash={}", loaded.config_hash);
    println!("plan_id={} plan_name={}", plan.plan_id, plan.name);
    println!("skipped_rows={skipped}");
    println!(
        "{}",
        serde_json::to_string_pretty(&projection).context("serialize projection failed")?
    );
    Ok(())
}
