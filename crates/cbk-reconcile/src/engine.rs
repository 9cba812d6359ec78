use std::collections::{BTreeMap, BTreeSet};
use std::thread;

use serde::Serialize;
use tracing::debug;

use cbk_ledger::{ContractError, DrilldownSource, LedgerRow, Mode, Money, PerMode, TeamYear};

use crate::adapter::{DrilldownTable, ReconcileInput};
use crate::summary::{ReconcileSummary, SummaryReport};
use crate::types::{ReconcileCheck, ReconcileLevel};

/// Per-row check producer.  One implementation per reconcile level; the
/// sequential and partitioned drivers are shared.
pub trait RowReconciler: Sync {
    fn check_row(&self, row: &LedgerRow, summary: &mut ReconcileSummary);

    fn reconcile(&self, rows: &[LedgerRow]) -> ReconcileSummary {
        let mut summary = ReconcileSummary::new();
        for row in rows {
            self.check_row(row, &mut summary);
        }
        summary
    }

    /// Reconcile contiguous chunks on scoped threads and merge in chunk order.
    /// Output is identical to [`RowReconciler::reconcile`].
    fn reconcile_partitioned(&self, rows: &[LedgerRow], partitions: usize) -> ReconcileSummary {
        if partitions <= 1 || rows.len() <= 1 {
            return self.reconcile(rows);
        }
        let chunk = rows.len().div_ceil(partitions);
        thread::scope(|s| {
            let handles: Vec<_> = rows
                .chunks(chunk)
                .map(|part| s.spawn(move || self.reconcile(part)))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
                .fold(ReconcileSummary::new(), ReconcileSummary::merge)
        })
    }
}

// ---------------------------------------------------------------------------
// Bucket level
// ---------------------------------------------------------------------------

/// Headline total vs Σ of the row's own buckets.  Exact.
#[derive(Clone, Copy, Debug, Default)]
pub struct BucketReconciler;

impl RowReconciler for BucketReconciler {
    fn check_row(&self, row: &LedgerRow, summary: &mut ReconcileSummary) {
        let key = row.key();
        for mode in Mode::ALL {
            let ledger = row.mode(mode);
            summary.add_check(ReconcileCheck::evaluate(
                &key,
                ReconcileLevel::Bucket,
                mode,
                ledger.total,
                ledger.bucket_sum(),
            ));
        }
    }
}

pub fn reconcile_buckets(rows: &[LedgerRow]) -> ReconcileSummary {
    reconcile_buckets_partitioned(rows, 1)
}

pub fn reconcile_buckets_partitioned(rows: &[LedgerRow], partitions: usize) -> ReconcileSummary {
    let summary = BucketReconciler.reconcile_partitioned(rows, partitions);
    debug!(
        rows = rows.len(),
        partitions,
        checks = summary.total_checks(),
        failed = summary.failed_checks(),
        "bucket reconcile complete"
    );
    summary
}

// ---------------------------------------------------------------------------
// Drilldown level
// ---------------------------------------------------------------------------

/// Accumulating per-table index keyed by (team_code, salary_year).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DrilldownIndex {
    tables: Vec<(DrilldownSource, BTreeMap<TeamYear, PerMode<Money>>)>,
}

impl DrilldownIndex {
    /// # Errors
    /// [`ContractError::NoDrilldownTables`] if `tables` is empty,
    /// [`ContractError::DuplicateSource`] if a source appears twice,
    /// [`ContractError::SourceMismatch`] if a record is filed under the wrong table.
    pub fn build(tables: &[DrilldownTable]) -> Result<Self, ContractError> {
        if tables.is_empty() {
            return Err(ContractError::NoDrilldownTables);
        }
        let mut seen = BTreeSet::new();
        let mut out = Vec::with_capacity(tables.len());
        for table in tables {
            if !seen.insert(table.source) {
                return Err(ContractError::DuplicateSource(table.source));
            }
            let mut by_key: BTreeMap<TeamYear, PerMode<Money>> = BTreeMap::new();
            for record in &table.records {
                if record.source != table.source {
                    return Err(ContractError::SourceMismatch {
                        table: table.source,
                        record: record.source,
                    });
                }
                // Many records per key; sum, never overwrite.
                *by_key.entry(record.key()).or_default() += record.amount;
            }
            out.push((table.source, by_key));
        }
        Ok(Self { tables: out })
    }

    /// Σ over tables of the accumulated amount for `key`; zero when absent.
    pub fn actual(&self, key: &TeamYear, mode: Mode) -> Money {
        self.tables
            .iter()
            .filter_map(|(_, by_key)| by_key.get(key))
            .map(|amount| amount[mode])
            .sum()
    }

    /// Accumulated amount for `key` in one source table.
    pub fn table_amount(&self, source: DrilldownSource, key: &TeamYear) -> Option<PerMode<Money>> {
        self.tables
            .iter()
            .find(|(s, _)| *s == source)
            .and_then(|(_, by_key)| by_key.get(key).copied())
    }

    pub fn sources(&self) -> impl Iterator<Item = DrilldownSource> + '_ {
        self.tables.iter().map(|(s, _)| *s)
    }

    /// Distinct drilldown keys that no snapshot row claims.
    pub fn orphan_keys(&self, rows: &[LedgerRow]) -> Vec<TeamYear> {
        let claimed: BTreeSet<TeamYear> = rows.iter().map(LedgerRow::key).collect();
        let all: BTreeSet<&TeamYear> = self
            .tables
            .iter()
            .flat_map(|(_, by_key)| by_key.keys())
            .collect();
        all.into_iter()
            .filter(|k| !claimed.contains(*k))
            .cloned()
            .collect()
    }
}

/// Headline total vs Σ of independently supplied drilldown tables.
/// Passes when |delta| < 1 currency unit.
#[derive(Clone, Debug)]
pub struct DrilldownReconciler {
    index: DrilldownIndex,
}

impl DrilldownReconciler {
    pub fn new(tables: &[DrilldownTable]) -> Result<Self, ContractError> {
        Ok(Self {
            index: DrilldownIndex::build(tables)?,
        })
    }

    pub fn index(&self) -> &DrilldownIndex {
        &self.index
    }
}

impl RowReconciler for DrilldownReconciler {
    fn check_row(&self, row: &LedgerRow, summary: &mut ReconcileSummary) {
        let key = row.key();
        for mode in Mode::ALL {
            summary.add_check(ReconcileCheck::evaluate(
                &key,
                ReconcileLevel::Drilldown,
                mode,
                row.mode(mode).total,
                self.index.actual(&key, mode),
            ));
        }
    }
}

fn log_orphans(count: usize) {
    if count > 0 {
        debug!(orphan_drilldown_keys = count, "drilldown keys without a snapshot row");
    }
}

pub fn reconcile_drilldowns(
    rows: &[LedgerRow],
    tables: &[DrilldownTable],
) -> Result<ReconcileSummary, ContractError> {
    reconcile_drilldowns_partitioned(rows, tables, 1)
}

pub fn reconcile_drilldowns_partitioned(
    rows: &[LedgerRow],
    tables: &[DrilldownTable],
    partitions: usize,
) -> Result<ReconcileSummary, ContractError> {
    let reconciler = DrilldownReconciler::new(tables)?;
    log_orphans(reconciler.index().orphan_keys(rows).len());
    let summary = reconciler.reconcile_partitioned(rows, partitions);
    let sources: Vec<&str> = reconciler.index().sources().map(DrilldownSource::as_str).collect();
    debug!(
        rows = rows.len(),
        partitions,
        sources = ?sources,
        checks = summary.total_checks(),
        failed = summary.failed_checks(),
        "drilldown reconcile complete"
    );
    Ok(summary)
}

// ---------------------------------------------------------------------------
// Full run
// ---------------------------------------------------------------------------

/// Both reconcile levels over one normalized input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconcileRun {
    pub buckets: ReconcileSummary,
    pub drilldowns: ReconcileSummary,
    pub orphan_drilldown_keys: usize,
}

impl ReconcileRun {
    pub fn passed(&self) -> bool {
        self.buckets.passed() && self.drilldowns.passed()
    }

    /// Every skipped row, snapshot or drilldown, is attached to the
    /// drilldown summary.
    pub fn skipped_rows(&self) -> usize {
        self.drilldowns.skipped_rows().len()
    }

    pub fn report(&self) -> RunReport {
        RunReport {
            passed: self.passed(),
            buckets: self.buckets.report(),
            drilldowns: self.drilldowns.report(),
            orphan_drilldown_keys: self.orphan_drilldown_keys,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunReport {
    pub passed: bool,
    pub buckets: SummaryReport,
    pub drilldowns: SummaryReport,
    pub orphan_drilldown_keys: usize,
}

/// Run both reconcilers.  Snapshot row errors are attached to both
/// summaries; drilldown row errors only to the drilldown summary.
pub fn reconcile_input(
    input: &ReconcileInput,
    partitions: usize,
) -> Result<ReconcileRun, ContractError> {
    let reconciler = DrilldownReconciler::new(&input.drilldowns)?;
    let orphans = reconciler.index().orphan_keys(&input.snapshot).len();
    log_orphans(orphans);

    let mut buckets = BucketReconciler.reconcile_partitioned(&input.snapshot, partitions);
    let mut drilldowns = reconciler.reconcile_partitioned(&input.snapshot, partitions);

    for err in &input.snapshot_errors {
        buckets.record_skipped(err.clone());
        drilldowns.record_skipped(err.clone());
    }
    for err in &input.drilldown_errors {
        drilldowns.record_skipped(err.clone());
    }

    debug!(
        rows = input.snapshot.len(),
        partitions,
        bucket_failed = buckets.failed_checks(),
        drilldown_failed = drilldowns.failed_checks(),
        orphan_drilldown_keys = orphans,
        "reconcile run complete"
    );

    Ok(ReconcileRun {
        buckets,
        drilldowns,
        orphan_drilldown_keys: orphans,
    })
}
