//! cbk-reconcile
//!
//! Two-level consistency checks over the ledger snapshot:
//! - Bucket level: each mode's headline total equals the sum of its four
//!   buckets, exactly.
//! - Drilldown level: each mode's headline total equals the accumulated sum
//!   of independent drilldown tables, within one currency unit.
//!
//! Failing checks are findings collected in a [`ReconcileSummary`]; they are
//! never raised.  Only contract violations (unknown names, conflicting or
//! missing tables) return an error.
//!
//! Pure logic. No IO.

mod adapter;
mod engine;
mod summary;
mod types;

pub use adapter::{
    normalize, normalize_drilldowns, normalize_json, normalize_snapshot, DrilldownTable,
    RawDrilldownTable, RawReconcileInput, RawRow, ReconcileInput, RowError, RowErrorReason,
    SNAPSHOT_TABLE,
};
pub use engine::{
    reconcile_buckets, reconcile_buckets_partitioned, reconcile_drilldowns,
    reconcile_drilldowns_partitioned, reconcile_input, BucketReconciler, DrilldownIndex,
    DrilldownReconciler, ReconcileRun, RowReconciler, RunReport,
};
pub use summary::{FailureEntry, ReconcileSummary, SampleEntry, SkippedRowEntry, SummaryReport};
pub use types::{ReconcileCheck, ReconcileLevel, Tolerance, FAILURE_REPORT_CAP, SAMPLE_HEAD};
