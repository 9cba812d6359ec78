//! cbk-ledger
//!
//! Cap ledger data model:
//! - Fixed-point money in minor units
//! - Three parallel accounting modes (cap / tax / apron) over one generic container
//! - Snapshot rows, drilldown records, plans, journal entries, subsystem outputs
//! - League thresholds, each bound to one mode
//!
//! Pure data. No IO.

mod error;
mod mode;
mod money;
mod threshold;
mod types;

pub use error::ContractError;
pub use mode::{Bucket, Mode, PerMode};
pub use money::{Money, MAX_INGEST_UNITS, MINOR_PER_UNIT};
pub use threshold::{ThresholdKind, ThresholdTable};
pub use types::{
    DrilldownRecord, DrilldownSource, JournalEntry, LedgerRow, ModeLedger, Plan, PlanId,
    SalaryYear, ScenarioContext, SubsystemOutput, TeamYear,
};

/// Helper to build a bucket array from whole currency units.
pub fn buckets_units(roster: i64, fa: i64, term: i64, two_way: i64) -> [Money; 4] {
    [
        Money::from_units(roster),
        Money::from_units(fa),
        Money::from_units(term),
        Money::from_units(two_way),
    ]
}
