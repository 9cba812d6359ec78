//! Journal / subsystem-output adapter.
//!
//! Journal rows are analyst-edited, so the wire format is loose: `enabled`
//! and `include` may be booleans or `Yes`/`No`, and a blank plan id or year
//! may arrive as `null` or `""`.  Rows that still do not parse are skipped
//! individually and reported; the rest of the journal is kept.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use cbk_ledger::{JournalEntry, Money, PerMode, Plan, PlanId, SalaryYear, SubsystemOutput};

use crate::ScenarioError;

pub const JOURNAL_TABLE: &str = "journal";
pub const SUBSYSTEM_TABLE: &str = "subsystem_outputs";

/// A journal or output row that could not be read.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SkippedRow {
    pub table: String,
    pub index: usize,
    pub reason: String,
}

// ---------------------------------------------------------------------------
// Loose field parsers
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseScalar {
    Bool(bool),
    Int(i64),
    Text(String),
}

fn de_flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    match Option::<LooseScalar>::deserialize(d)? {
        None => Ok(false),
        Some(LooseScalar::Bool(b)) => Ok(b),
        Some(LooseScalar::Int(i)) => Ok(i != 0),
        Some(LooseScalar::Text(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "yes" | "y" | "true" | "1" => Ok(true),
            "no" | "n" | "false" | "0" | "" => Ok(false),
            other => Err(de::Error::custom(format!("not a yes/no flag: {other}"))),
        },
    }
}

fn de_blank_int<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    match Option::<LooseScalar>::deserialize(d)? {
        None => Ok(None),
        Some(LooseScalar::Int(i)) => Ok(Some(i)),
        Some(LooseScalar::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(LooseScalar::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("not an integer: {s}"))),
        Some(LooseScalar::Bool(b)) => Err(de::Error::custom(format!("not an integer: {b}"))),
    }
}

// ---------------------------------------------------------------------------
// Raw wire-level structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct RawJournalRow {
    #[serde(default)]
    pub step: Option<u32>,
    #[serde(default, deserialize_with = "de_blank_int")]
    pub plan_id: Option<i64>,
    #[serde(default, deserialize_with = "de_flag")]
    pub enabled: bool,
    #[serde(default, deserialize_with = "de_blank_int")]
    pub salary_year: Option<i64>,
    #[serde(default)]
    pub action_type: Option<String>,
    #[serde(default)]
    pub delta_cap: Option<f64>,
    #[serde(default)]
    pub delta_tax: Option<f64>,
    #[serde(default)]
    pub delta_apron: Option<f64>,
    #[serde(default)]
    pub source_note: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSubsystemRow {
    pub source: String,
    #[serde(deserialize_with = "de_blank_int")]
    pub plan_id: Option<i64>,
    #[serde(deserialize_with = "de_blank_int")]
    pub salary_year: Option<i64>,
    #[serde(default, deserialize_with = "de_flag")]
    pub include: bool,
    #[serde(default)]
    pub delta_cap: Option<f64>,
    #[serde(default)]
    pub delta_tax: Option<f64>,
    #[serde(default)]
    pub delta_apron: Option<f64>,
}

/// Scenario collections of an input bundle.  Other bundle keys are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawScenarioInput {
    #[serde(default)]
    pub plans: Vec<Plan>,
    #[serde(default)]
    pub journal: Vec<Value>,
    #[serde(default)]
    pub subsystem_outputs: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScenarioInput {
    pub plans: Vec<Plan>,
    pub journal: Vec<JournalEntry>,
    pub outputs: Vec<SubsystemOutput>,
    pub skipped: Vec<SkippedRow>,
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

fn delta(cap: Option<f64>, tax: Option<f64>, apron: Option<f64>) -> Result<PerMode<Money>, String> {
    let one = |name: &str, v: Option<f64>| match v {
        None => Ok(Money::ZERO),
        Some(f) => Money::from_units_f64(f)
            .and_then(Money::bounded)
            .ok_or_else(|| format!("{name} is out of range: {f}")),
    };
    Ok(PerMode::new(
        one("delta_cap", cap)?,
        one("delta_tax", tax)?,
        one("delta_apron", apron)?,
    ))
}

fn plan_id(raw: Option<i64>) -> Result<Option<PlanId>, String> {
    raw.map(|p| u32::try_from(p).map(PlanId).map_err(|_| format!("plan_id out of range: {p}")))
        .transpose()
}

fn year(raw: Option<i64>) -> Result<Option<SalaryYear>, String> {
    raw.map(|y| SalaryYear::try_from(y).map_err(|_| format!("salary_year out of range: {y}")))
        .transpose()
}

fn journal_entry(index: usize, value: &Value) -> Result<JournalEntry, String> {
    let raw: RawJournalRow = serde_json::from_value(value.clone()).map_err(|e| e.to_string())?;
    Ok(JournalEntry {
        // Rows without a step sort by their position.
        step: match raw.step {
            Some(s) => s,
            None => u32::try_from(index + 1).unwrap_or(u32::MAX),
        },
        plan_id: plan_id(raw.plan_id)?,
        enabled: raw.enabled,
        salary_year: year(raw.salary_year)?,
        action_type: raw.action_type.unwrap_or_default().trim().to_string(),
        delta: delta(raw.delta_cap, raw.delta_tax, raw.delta_apron)?,
        source_note: raw.source_note.unwrap_or_default(),
    })
}

fn subsystem_output(value: &Value) -> Result<SubsystemOutput, String> {
    let raw: RawSubsystemRow = serde_json::from_value(value.clone()).map_err(|e| e.to_string())?;
    Ok(SubsystemOutput {
        source: raw.source.trim().to_string(),
        plan_id: plan_id(raw.plan_id)?.ok_or("plan_id is required")?,
        salary_year: year(raw.salary_year)?.ok_or("salary_year is required")?,
        include: raw.include,
        delta: delta(raw.delta_cap, raw.delta_tax, raw.delta_apron)?,
    })
}

fn skipped(table: &str, index: usize, reason: String) -> SkippedRow {
    let row = SkippedRow {
        table: table.to_string(),
        index,
        reason,
    };
    warn!(table = %row.table, index = row.index, reason = %row.reason, "skipping malformed row");
    row
}

pub fn normalize_scenario(raw: &RawScenarioInput) -> ScenarioInput {
    let mut out = ScenarioInput {
        plans: raw.plans.clone(),
        ..ScenarioInput::default()
    };
    for (index, value) in raw.journal.iter().enumerate() {
        match journal_entry(index, value) {
            Ok(e) => out.journal.push(e),
            Err(reason) => out.skipped.push(skipped(JOURNAL_TABLE, index, reason)),
        }
    }
    for (index, value) in raw.subsystem_outputs.iter().enumerate() {
        match subsystem_output(value) {
            Ok(o) => out.outputs.push(o),
            Err(reason) => out.skipped.push(skipped(SUBSYSTEM_TABLE, index, reason)),
        }
    }
    out
}

/// Resolve a plan by numeric id or by case-insensitive name.
pub fn find_plan<'a>(plans: &'a [Plan], selector: &str) -> Result<&'a Plan, ScenarioError> {
    let selector = selector.trim();
    if let Ok(id) = selector.parse::<u32>() {
        if let Some(p) = plans.iter().find(|p| p.plan_id == PlanId(id)) {
            return Ok(p);
        }
    }
    let mut named = plans
        .iter()
        .filter(|p| p.name.trim().eq_ignore_ascii_case(selector));
    match (named.next(), named.next()) {
        (Some(p), None) => Ok(p),
        (Some(_), Some(_)) => Err(ScenarioError::AmbiguousPlan(selector.to_string())),
        (None, _) => Err(ScenarioError::UnknownPlan(selector.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(journal: Vec<Value>, outputs: Vec<Value>) -> RawScenarioInput {
        RawScenarioInput {
            plans: vec![],
            journal,
            subsystem_outputs: outputs,
        }
    }

    #[test]
    fn loose_flags_and_blanks() {
        let input = normalize_scenario(&raw(
            vec![
                json!({"step": 1, "plan_id": "", "enabled": "Yes", "salary_year": null,
                       "action_type": "Trade", "delta_cap": 50}),
                json!({"step": 2, "plan_id": 2, "enabled": "No", "salary_year": "2025",
                       "action_type": "Waive", "delta_tax": -3.5}),
            ],
            vec![],
        ));
        assert!(input.skipped.is_empty());
        let a = &input.journal[0];
        assert_eq!((a.plan_id, a.enabled, a.salary_year), (None, true, None));
        assert_eq!(a.delta.cap, Money::from_units(50));
        let b = &input.journal[1];
        assert_eq!((b.plan_id, b.enabled, b.salary_year), (Some(PlanId(2)), false, Some(2025)));
        assert_eq!(b.delta.tax, Money::from_minor(-350));
    }

    #[test]
    fn bad_journal_row_skipped_individually() {
        let input = normalize_scenario(&raw(
            vec![
                json!({"step": 1, "enabled": "maybe"}),
                json!({"step": 2, "enabled": true, "action_type": "Sign (Minimum)"}),
            ],
            vec![],
        ));
        assert_eq!(input.journal.len(), 1);
        assert_eq!(input.skipped.len(), 1);
        assert_eq!(input.skipped[0].table, JOURNAL_TABLE);
        assert_eq!(input.skipped[0].index, 0);
    }

    #[test]
    fn oversized_delta_skips_only_that_row() {
        let input = normalize_scenario(&raw(
            vec![
                json!({"step": 1, "enabled": true, "action_type": "Trade", "delta_cap": 5e16}),
                json!({"step": 2, "enabled": true, "action_type": "Trade", "delta_cap": 12}),
            ],
            vec![json!({"source": "Trade Lane A", "plan_id": 1, "salary_year": 2025,
                        "include": true, "delta_apron": -9e18})],
        ));
        assert_eq!(input.journal.len(), 1);
        assert_eq!(input.journal[0].delta.cap, Money::from_units(12));
        assert!(input.outputs.is_empty());
        let reasons: Vec<&str> = input.skipped.iter().map(|r| r.reason.as_str()).collect();
        assert!(reasons[0].starts_with("delta_cap is out of range"));
        assert!(reasons[1].starts_with("delta_apron is out of range"));
    }

    #[test]
    fn output_requires_plan_and_year() {
        let input = normalize_scenario(&raw(
            vec![],
            vec![
                json!({"source": "Trade Lane A", "plan_id": 1, "salary_year": 2025,
                       "include": "Yes", "delta_cap": 5}),
                json!({"source": "Signings", "plan_id": "", "salary_year": 2025}),
            ],
        ));
        assert_eq!(input.outputs.len(), 1);
        assert!(input.outputs[0].include);
        assert_eq!(input.skipped[0].table, SUBSYSTEM_TABLE);
    }

    #[test]
    fn find_plan_by_id_or_name() {
        let plans = vec![
            Plan {
                plan_id: PlanId(1),
                name: "Baseline".to_string(),
                active: true,
            },
            Plan {
                plan_id: PlanId(2),
                name: "Deadline".to_string(),
                active: true,
            },
        ];
        assert_eq!(find_plan(&plans, "2").unwrap().name, "Deadline");
        assert_eq!(find_plan(&plans, "baseline").unwrap().plan_id, PlanId(1));
        assert_eq!(
            find_plan(&plans, "Offseason"),
            Err(ScenarioError::UnknownPlan("Offseason".to_string()))
        );
    }
}
