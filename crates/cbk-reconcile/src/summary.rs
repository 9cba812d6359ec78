//! Reconcile summary: aggregation of check outcomes for reporting.
//!
//! Counters, the overall pass flag and the failure list accumulate without a
//! cap; caps are applied only when the summary is rendered into a
//! [`SummaryReport`].  The sample list holds the first [`SAMPLE_HEAD`] checks
//! seen plus every failing check, in input order.

use serde::Serialize;

use cbk_ledger::{Money, SalaryYear};

use crate::adapter::RowError;
use crate::types::{ReconcileCheck, FAILURE_REPORT_CAP, SAMPLE_HEAD};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconcileSummary {
    passed: bool,
    total_checks: usize,
    passed_checks: usize,
    failed_checks: usize,
    failures: Vec<ReconcileCheck>,
    sample_checks: Vec<ReconcileCheck>,
    skipped_rows: Vec<RowError>,
}

impl Default for ReconcileSummary {
    fn default() -> Self {
        Self::new()
    }
}

impl ReconcileSummary {
    pub fn new() -> Self {
        Self {
            passed: true,
            total_checks: 0,
            passed_checks: 0,
            failed_checks: 0,
            failures: Vec::new(),
            sample_checks: Vec::new(),
            skipped_rows: Vec::new(),
        }
    }

    pub fn add_check(&mut self, check: ReconcileCheck) {
        let keep_sample = self.total_checks < SAMPLE_HEAD || !check.passed;
        self.total_checks += 1;
        if check.passed {
            self.passed_checks += 1;
        } else {
            self.failed_checks += 1;
            self.passed = false;
            self.failures.push(check.clone());
        }
        if keep_sample {
            self.sample_checks.push(check);
        }
    }

    /// Record a malformed input row that was skipped.
    pub fn record_skipped(&mut self, err: RowError) {
        self.skipped_rows.push(err);
    }

    /// Combine two summaries as if `other`'s checks had been added after
    /// `self`'s.  Associative; `ReconcileSummary::new()` is the identity.
    pub fn merge(mut self, other: ReconcileSummary) -> ReconcileSummary {
        let offset = self.total_checks;
        // other's sample list starts with its first min(n, SAMPLE_HEAD) checks
        // in order; everything after those is a failure.
        let positional = other.total_checks.min(SAMPLE_HEAD);
        for (j, check) in other.sample_checks.into_iter().enumerate() {
            if j >= positional || !check.passed || offset + j < SAMPLE_HEAD {
                self.sample_checks.push(check);
            }
        }

        self.passed &= other.passed;
        self.total_checks += other.total_checks;
        self.passed_checks += other.passed_checks;
        self.failed_checks += other.failed_checks;
        self.failures.extend(other.failures);
        self.skipped_rows.extend(other.skipped_rows);
        self
    }

    /// `true` iff every check passed (vacuously true with no checks).
    pub fn passed(&self) -> bool {
        self.passed
    }

    pub fn total_checks(&self) -> usize {
        self.total_checks
    }

    pub fn passed_checks(&self) -> usize {
        self.passed_checks
    }

    pub fn failed_checks(&self) -> usize {
        self.failed_checks
    }

    /// Every failing check, uncapped, in input order.
    pub fn all_failures(&self) -> &[ReconcileCheck] {
        &self.failures
    }

    /// First [`FAILURE_REPORT_CAP`] failing checks.
    pub fn failures(&self) -> &[ReconcileCheck] {
        &self.failures[..self.failures.len().min(FAILURE_REPORT_CAP)]
    }

    /// First [`SAMPLE_HEAD`] checks plus every failing check.
    pub fn sample_checks(&self) -> &[ReconcileCheck] {
        &self.sample_checks
    }

    pub fn skipped_rows(&self) -> &[RowError] {
        &self.skipped_rows
    }

    /// Render the capped, serializable view handed to the reporting layer.
    pub fn report(&self) -> SummaryReport {
        SummaryReport {
            passed: self.passed,
            total_checks: self.total_checks,
            passed_checks: self.passed_checks,
            failed_checks: self.failed_checks,
            failures: self
                .failures()
                .iter()
                .map(|c| FailureEntry {
                    team_code: c.team_code.clone(),
                    salary_year: c.salary_year,
                    check: c.check_name.clone(),
                    expected: c.expected,
                    actual: c.actual,
                    delta: c.delta,
                })
                .collect(),
            sample_checks: self
                .sample_checks
                .iter()
                .take(SAMPLE_HEAD)
                .map(|c| SampleEntry {
                    team_code: c.team_code.clone(),
                    salary_year: c.salary_year,
                    check: c.check_name.clone(),
                    passed: c.passed,
                })
                .collect(),
            skipped_rows: self
                .skipped_rows
                .iter()
                .map(|e| SkippedRowEntry {
                    table: e.table.clone(),
                    index: e.index,
                    reason: e.reason.to_string(),
                })
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Serializable report
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SummaryReport {
    pub passed: bool,
    pub total_checks: usize,
    pub passed_checks: usize,
    pub failed_checks: usize,
    pub failures: Vec<FailureEntry>,
    pub sample_checks: Vec<SampleEntry>,
    pub skipped_rows: Vec<SkippedRowEntry>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FailureEntry {
    pub team_code: String,
    pub salary_year: SalaryYear,
    pub check: String,
    pub expected: Money,
    pub actual: Money,
    pub delta: Money,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SampleEntry {
    pub team_code: String,
    pub salary_year: SalaryYear,
    pub check: String,
    pub passed: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SkippedRowEntry {
    pub table: String,
    pub index: usize,
    pub reason: String,
}
