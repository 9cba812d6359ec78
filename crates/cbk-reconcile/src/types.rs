use serde::Serialize;

use cbk_ledger::{Mode, Money, SalaryYear, TeamYear};

/// Number of failures exposed by [`crate::ReconcileSummary::report`].
pub const FAILURE_REPORT_CAP: usize = 10;

/// Number of leading checks always kept as samples.
pub const SAMPLE_HEAD: usize = 5;

/// How close `expected` and `actual` must be for a check to pass.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Tolerance {
    /// `delta == 0`.
    Exact,
    /// `|delta| < 1` currency unit; absorbs rounding accumulated across
    /// independently aggregated source tables.
    BelowOneUnit,
}

impl Tolerance {
    pub fn accepts(self, delta: Money) -> bool {
        match self {
            Tolerance::Exact => delta.is_zero(),
            Tolerance::BelowOneUnit => delta.abs() < Money::ONE_UNIT,
        }
    }
}

/// Which reconciliation a check belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileLevel {
    /// Headline total vs the row's own buckets.
    Bucket,
    /// Headline total vs independently supplied drilldown tables.
    Drilldown,
}

impl ReconcileLevel {
    pub fn tolerance(self) -> Tolerance {
        match self {
            ReconcileLevel::Bucket => Tolerance::Exact,
            ReconcileLevel::Drilldown => Tolerance::BelowOneUnit,
        }
    }

    /// Stable check name, e.g. `cap_total`, `apron_drilldown`.
    pub fn check_name(self, mode: Mode) -> String {
        match self {
            ReconcileLevel::Bucket => format!("{mode}_total"),
            ReconcileLevel::Drilldown => format!("{mode}_drilldown"),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReconcileLevel::Bucket => "bucket",
            ReconcileLevel::Drilldown => "drilldown",
        }
    }
}

/// One comparison result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReconcileCheck {
    pub team_code: String,
    pub salary_year: SalaryYear,
    pub check_name: String,
    pub mode: Mode,
    /// Headline total.
    pub expected: Money,
    /// Sum of the parts.
    pub actual: Money,
    /// `expected - actual`.
    pub delta: Money,
    pub passed: bool,
}

impl ReconcileCheck {
    pub fn evaluate(
        key: &TeamYear,
        level: ReconcileLevel,
        mode: Mode,
        expected: Money,
        actual: Money,
    ) -> Self {
        let delta = expected - actual;
        Self {
            team_code: key.team_code.clone(),
            salary_year: key.salary_year,
            check_name: level.check_name(mode),
            mode,
            expected,
            actual,
            delta,
            passed: level.tolerance().accepts(delta),
        }
    }
}
