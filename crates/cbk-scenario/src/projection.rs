//! One-call projection: snapshot + plan deltas + roster-fill policy for a
//! single team under a [`ScenarioContext`].

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use cbk_ledger::{JournalEntry, LedgerRow, SalaryYear, ScenarioContext, SubsystemOutput, ThresholdTable};

use crate::derived::{DerivedPosition, DerivedStateCalculator};
use crate::journal::{DeltaAggregator, JournalCounts, JournalFilter, PlanDeltas};
use crate::policy::{MinimumScale, PolicyDelta, Proration, RosterFillPolicy, SeasonCalendar};
use crate::ScenarioError;

/// Settings that stay fixed across scenarios.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProjectionSettings {
    pub filter: JournalFilter,
    pub roster_fill: RosterFillPolicy,
    pub active_year: SalaryYear,
    pub as_of: NaiveDate,
    pub season: SeasonCalendar,
}

/// League data for the selected year.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct YearTables {
    pub thresholds: ThresholdTable,
    pub minimums: MinimumScale,
}

#[derive(Clone, Copy, Debug)]
pub struct ProjectionInputs<'a> {
    pub snapshot: &'a [LedgerRow],
    pub journal: &'a [JournalEntry],
    pub outputs: &'a [SubsystemOutput],
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Projection {
    pub position: DerivedPosition,
    pub plan_deltas: PlanDeltas,
    pub policy: PolicyDelta,
    pub journal_counts: JournalCounts,
}

pub fn project(
    team_code: &str,
    ctx: &ScenarioContext,
    current_roster: u32,
    inputs: ProjectionInputs<'_>,
    settings: &ProjectionSettings,
    tables: &YearTables,
) -> Result<Projection, ScenarioError> {
    let row = inputs
        .snapshot
        .iter()
        .find(|r| r.team_code == team_code && r.salary_year == ctx.salary_year)
        .ok_or_else(|| ScenarioError::MissingSnapshotRow {
            team_code: team_code.to_string(),
            salary_year: ctx.salary_year,
        })?;

    let aggregator = DeltaAggregator::new(settings.filter);
    let plan_deltas = aggregator.aggregate(ctx, inputs.journal, inputs.outputs);
    let journal_counts = aggregator.counts(ctx, inputs.journal);

    let proration = Proration::for_year(
        ctx.salary_year,
        settings.active_year,
        &settings.season,
        settings.as_of,
    );
    let policy = settings
        .roster_fill
        .evaluate(current_roster, &tables.minimums, proration)?;

    let modes = DerivedStateCalculator::new(&tables.thresholds).derive_modes(
        &row.totals(),
        &plan_deltas.total(),
        &policy.amount,
    );

    debug!(
        team_code,
        plan_id = %ctx.plan_id,
        salary_year = ctx.salary_year,
        fill_count = policy.fill_count,
        derived_cap = %modes.cap.derived_total,
        "projection derived"
    );

    Ok(Projection {
        position: DerivedPosition {
            team_code: row.team_code.clone(),
            salary_year: row.salary_year,
            plan_id: ctx.plan_id,
            modes,
        },
        plan_deltas,
        policy,
        journal_counts,
    })
}
