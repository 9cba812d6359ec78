use chrono::NaiveDate;
use thiserror::Error;

use cbk_ledger::SalaryYear;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScenarioError {
    #[error("no plan matches '{0}'")]
    UnknownPlan(String),

    #[error("plan name '{0}' is ambiguous")]
    AmbiguousPlan(String),

    #[error("season last day {last} precedes first day {first}")]
    InvalidSeason { first: NaiveDate, last: NaiveDate },

    #[error("no snapshot row for {team_code} {salary_year}")]
    MissingSnapshotRow {
        team_code: String,
        salary_year: SalaryYear,
    },

    #[error("roster fill amount overflows for {fill_count} slots")]
    FillOverflow { fill_count: u32 },
}
