//! cbk-scenario
//!
//! Scenario projection over the ledger snapshot:
//! - Journal filtering and per-mode delta aggregation for an explicit
//!   (plan, year) context
//! - Roster-fill policy with in-season proration
//! - Derived totals and room against each threshold of the same mode
//!
//! Pure logic. No IO.

mod adapter;
mod derived;
mod error;
mod journal;
mod policy;
mod projection;

pub use adapter::{
    find_plan, normalize_scenario, RawJournalRow, RawScenarioInput, RawSubsystemRow,
    ScenarioInput, SkippedRow, JOURNAL_TABLE, SUBSYSTEM_TABLE,
};
pub use derived::{DerivedPosition, DerivedStateCalculator, ModePosition};
pub use error::ScenarioError;
pub use journal::{
    BlankPlanScope, DeltaAggregator, JournalCounts, JournalFilter, PlanDeltas, UNTYPED_ACTION,
};
pub use policy::{FillType, MinimumScale, PolicyDelta, Proration, RosterFillPolicy, SeasonCalendar};
pub use projection::{project, Projection, ProjectionInputs, ProjectionSettings, YearTables};
