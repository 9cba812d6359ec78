//! Row adapter: deserialize warehouse rows and normalize to ledger types.
//!
//! # Purpose
//! The storage layer hands over flat JSON objects whose column names follow
//! the warehouse convention (`cap_total`, `tax_rost`, `apron_2way`,
//! `cap_amount`, `tax_value`, ...).  This module maps those rows onto
//! [`LedgerRow`] / [`DrilldownRecord`] by deriving column names from
//! [`Mode`] and [`Bucket`], so there is one code path for all three modes.
//!
//! # Failure classes
//! - A row without a usable `team_code` / `salary_year`, or with a
//!   non-numeric amount, is skipped and reported as a [`RowError`].
//!   The rest of the batch is unaffected.
//! - A table-level contract violation (unknown source, duplicate source,
//!   a row tagged with a different source than its table) is a
//!   [`ContractError`] and aborts normalization.
//! - Absent and `null` amounts are zero.

use std::collections::BTreeSet;

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use cbk_ledger::{
    Bucket, ContractError, DrilldownRecord, DrilldownSource, LedgerRow, Mode, ModeLedger, Money,
    PerMode, SalaryYear, TeamYear,
};

/// Table label used in [`RowError`] for snapshot rows.
pub const SNAPSHOT_TABLE: &str = "snapshot";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowErrorReason {
    #[error("missing or blank team_code")]
    MissingTeamCode,
    #[error("missing salary_year")]
    MissingSalaryYear,
    #[error("salary_year is not an integer year: {0}")]
    InvalidSalaryYear(String),
    #[error("column '{column}' is not numeric: {raw}")]
    InvalidAmount { column: String, raw: String },
}

/// A malformed row that was skipped.  Recorded against that row only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{table} row {index}: {reason}")]
pub struct RowError {
    pub table: String,
    /// Zero-based position in the input table.
    pub index: usize,
    pub reason: RowErrorReason,
}

// ---------------------------------------------------------------------------
// Raw wire-level structs
// ---------------------------------------------------------------------------

/// One warehouse row as a flat JSON object.
///
/// Unknown columns are ignored so upstream schema additions don't break
/// deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct RawRow(pub Map<String, Value>);

impl RawRow {
    fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column).filter(|v| !v.is_null())
    }
}

/// One drilldown source table.
#[derive(Debug, Clone, Deserialize)]
pub struct RawDrilldownTable {
    /// `salary_book` | `cap_holds` | `dead_money` (warehouse names accepted).
    pub source: String,
    #[serde(default)]
    pub rows: Vec<RawRow>,
}

/// Everything the two reconcilers need, as supplied by the storage layer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawReconcileInput {
    #[serde(default)]
    pub snapshot: Vec<RawRow>,
    #[serde(default)]
    pub drilldowns: Vec<RawDrilldownTable>,
}

/// A normalized drilldown table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrilldownTable {
    pub source: DrilldownSource,
    pub records: Vec<DrilldownRecord>,
}

impl DrilldownTable {
    pub fn new(source: DrilldownSource, records: Vec<DrilldownRecord>) -> Self {
        Self { source, records }
    }
}

/// Normalized input plus the rows that had to be skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileInput {
    pub snapshot: Vec<LedgerRow>,
    pub drilldowns: Vec<DrilldownTable>,
    pub snapshot_errors: Vec<RowError>,
    pub drilldown_errors: Vec<RowError>,
}

// ---------------------------------------------------------------------------
// Normalization helpers
// ---------------------------------------------------------------------------

fn row_err(table: &str, index: usize, reason: RowErrorReason) -> RowError {
    RowError {
        table: table.to_string(),
        index,
        reason,
    }
}

fn parse_key(row: &RawRow) -> Result<TeamYear, RowErrorReason> {
    let team_code = match row.get("team_code") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        _ => return Err(RowErrorReason::MissingTeamCode),
    };
    let salary_year = match row.get("salary_year") {
        None => return Err(RowErrorReason::MissingSalaryYear),
        Some(v) => parse_year(v).ok_or_else(|| RowErrorReason::InvalidSalaryYear(v.to_string()))?,
    };
    Ok(TeamYear::new(team_code, salary_year))
}

fn parse_year(v: &Value) -> Option<SalaryYear> {
    match v {
        Value::Number(n) => n.as_i64().and_then(|y| SalaryYear::try_from(y).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_amount(row: &RawRow, column: &str) -> Result<Money, RowErrorReason> {
    let Some(v) = row.get(column) else {
        return Ok(Money::ZERO);
    };
    let bad = || RowErrorReason::InvalidAmount {
        column: column.to_string(),
        raw: v.to_string(),
    };
    match v {
        // Integers stay exact; only fractional amounts take the f64 path.
        Value::Number(n) => match n.as_i64() {
            Some(units) => Money::checked_from_units(units),
            None => n.as_f64().and_then(Money::from_units_f64),
        }
        .and_then(Money::bounded)
        .ok_or_else(bad),
        _ => Err(bad()),
    }
}

fn total_column(mode: Mode) -> String {
    format!("{mode}_total")
}

fn bucket_column(mode: Mode, bucket: Bucket) -> String {
    format!("{mode}_{}", bucket.suffix())
}

/// Drilldown tables name their per-mode column `<mode>_amount`, except dead
/// money which uses `<mode>_value`.  Either spelling is accepted everywhere.
fn drilldown_amount(row: &RawRow, mode: Mode) -> Result<Money, RowErrorReason> {
    let amount_col = format!("{mode}_amount");
    if row.get(&amount_col).is_some() {
        return parse_amount(row, &amount_col);
    }
    parse_amount(row, &format!("{mode}_value"))
}

fn normalize_ledger_row(row: &RawRow) -> Result<LedgerRow, RowErrorReason> {
    let key = parse_key(row)?;
    let mut out = LedgerRow::new(key.team_code, key.salary_year);
    for mode in Mode::ALL {
        let total = parse_amount(row, &total_column(mode))?;
        let mut buckets = [Money::ZERO; 4];
        for bucket in Bucket::ALL {
            buckets[bucket.index()] = parse_amount(row, &bucket_column(mode, bucket))?;
        }
        out.modes[mode] = ModeLedger::new(total, buckets);
    }
    Ok(out)
}

fn normalize_drilldown_row(
    source: DrilldownSource,
    row: &RawRow,
) -> Result<Result<DrilldownRecord, RowErrorReason>, ContractError> {
    if let Some(Value::String(tag)) = row.get("source") {
        let record: DrilldownSource = tag.parse()?;
        if record != source {
            return Err(ContractError::SourceMismatch {
                table: source,
                record,
            });
        }
    }
    let parsed = parse_key(row).and_then(|key| {
        let mut amount = PerMode::<Money>::ZERO;
        for mode in Mode::ALL {
            amount[mode] = drilldown_amount(row, mode)?;
        }
        Ok(DrilldownRecord::new(source, key.team_code, key.salary_year, amount))
    });
    Ok(parsed)
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Normalize snapshot rows, skipping malformed ones.
///
/// Valid rows keep their input order; that order fixes which checks become
/// the leading samples of a summary.
pub fn normalize_snapshot(rows: &[RawRow]) -> (Vec<LedgerRow>, Vec<RowError>) {
    let mut out = Vec::with_capacity(rows.len());
    let mut errors = Vec::new();
    for (index, raw) in rows.iter().enumerate() {
        match normalize_ledger_row(raw) {
            Ok(row) => out.push(row),
            Err(reason) => {
                let err = row_err(SNAPSHOT_TABLE, index, reason);
                warn!(%err, "skipping malformed snapshot row");
                errors.push(err);
            }
        }
    }
    (out, errors)
}

/// Normalize drilldown tables.
///
/// # Errors
/// Returns a [`ContractError`] for an unknown or duplicated source, or for a
/// row whose own `source` tag disagrees with its table.  Malformed rows are
/// skipped and returned alongside the tables.
pub fn normalize_drilldowns(
    tables: &[RawDrilldownTable],
) -> Result<(Vec<DrilldownTable>, Vec<RowError>), ContractError> {
    let mut seen: BTreeSet<DrilldownSource> = BTreeSet::new();
    let mut out = Vec::with_capacity(tables.len());
    let mut errors = Vec::new();

    for table in tables {
        let source: DrilldownSource = table.source.parse()?;
        if !seen.insert(source) {
            return Err(ContractError::DuplicateSource(source));
        }
        let mut records = Vec::with_capacity(table.rows.len());
        for (index, raw) in table.rows.iter().enumerate() {
            match normalize_drilldown_row(source, raw)? {
                Ok(record) => records.push(record),
                Err(reason) => {
                    let err = row_err(source.as_str(), index, reason);
                    warn!(%err, "skipping malformed drilldown row");
                    errors.push(err);
                }
            }
        }
        out.push(DrilldownTable::new(source, records));
    }
    Ok((out, errors))
}

/// Normalize a full reconcile input.
pub fn normalize(raw: &RawReconcileInput) -> Result<ReconcileInput, ContractError> {
    let (snapshot, snapshot_errors) = normalize_snapshot(&raw.snapshot);
    let (drilldowns, drilldown_errors) = normalize_drilldowns(&raw.drilldowns)?;
    Ok(ReconcileInput {
        snapshot,
        drilldowns,
        snapshot_errors,
        drilldown_errors,
    })
}

/// Deserialize a JSON document directly into a [`ReconcileInput`].
pub fn normalize_json(json: &str) -> Result<ReconcileInput, Box<dyn std::error::Error>> {
    let raw: RawReconcileInput = serde_json::from_str(json)?;
    Ok(normalize(&raw)?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
