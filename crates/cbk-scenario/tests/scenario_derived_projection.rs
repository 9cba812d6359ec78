//! Scenario: derived position for a selected (plan, year).
//!
//! # Invariants under test
//!
//! 1. snapshot 500 + enabled entry 50 + disabled entry (ignored) + policy 20
//!    gives derived 570; against a threshold of 600 the room is 30.
//! 2. A disabled journal entry never contributes, whatever its plan/year.
//! 3. A journal entry with a blank year contributes to every selected year.
//! 4. Subsystem outputs contribute only for an exact (plan, year) match.
//! 5. Roster fill is prorated in the active year only.
//!
//! All tests are pure; no IO.

use chrono::NaiveDate;

use cbk_ledger::{
    buckets_units, JournalEntry, LedgerRow, Mode, Money, PerMode, PlanId, ScenarioContext,
    SubsystemOutput, ThresholdKind, ThresholdTable,
};
use cbk_scenario::*;

fn units(n: i64) -> Money {
    Money::from_units(n)
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn snapshot(years: &[i32]) -> Vec<LedgerRow> {
    years
        .iter()
        .map(|&y| {
            let mut row = LedgerRow::new("POR", y);
            for m in Mode::ALL {
                row = row.with_mode(m, units(500), buckets_units(500, 0, 0, 0));
            }
            row
        })
        .collect()
}

fn entry(step: u32, enabled: bool, year: Option<i32>, amount: i64) -> JournalEntry {
    JournalEntry {
        step,
        plan_id: Some(PlanId(2)),
        enabled,
        salary_year: year,
        action_type: "Trade".to_string(),
        delta: PerMode::splat(units(amount)),
        source_note: String::new(),
    }
}

fn settings(target: u32) -> ProjectionSettings {
    ProjectionSettings {
        filter: JournalFilter::default(),
        roster_fill: RosterFillPolicy::new(target, FillType::VetMin),
        active_year: 2025,
        as_of: date(2025, 10, 1),
        season: SeasonCalendar::new(date(2025, 10, 1), date(2025, 10, 10)).unwrap(),
    }
}

fn tables() -> YearTables {
    YearTables {
        thresholds: ThresholdTable::new()
            .with(ThresholdKind::SalaryCap, units(600))
            .with(ThresholdKind::TaxLevel, units(560))
            .with(ThresholdKind::FirstApron, units(600)),
        minimums: MinimumScale {
            rookie_min: units(15),
            vet_min: units(20),
        },
    }
}

#[test]
fn scenario_snapshot_plus_deltas_plus_policy() {
    let snap = snapshot(&[2025]);
    let journal = vec![entry(1, true, Some(2025), 50), entry(2, false, Some(2025), 0)];
    let ctx = ScenarioContext::new(PlanId(2), 2025);

    let p = project(
        "POR",
        &ctx,
        13,
        ProjectionInputs {
            snapshot: &snap,
            journal: &journal,
            outputs: &[],
        },
        &settings(14),
        &tables(),
    )
    .unwrap();

    let cap = p.position.mode(Mode::Cap);
    assert_eq!(cap.snapshot_total, units(500));
    assert_eq!(cap.plan_delta_total, units(50));
    assert_eq!(cap.policy_delta_total, units(20));
    assert_eq!(cap.derived_total, units(570));
    assert_eq!(cap.room(ThresholdKind::SalaryCap), Some(units(30)));
    assert_eq!(cap.is_over(ThresholdKind::SalaryCap), Some(false));

    let tax = p.position.mode(Mode::Tax);
    assert_eq!(tax.room(ThresholdKind::TaxLevel), Some(units(-10)));

    assert_eq!(
        p.journal_counts,
        JournalCounts {
            total_rows: 2,
            enabled_rows: 1,
            disabled_rows: 1
        }
    );
}

#[test]
fn scenario_disabled_entry_excluded_everywhere() {
    let journal = vec![entry(1, false, None, 999)];
    let agg = DeltaAggregator::default();
    for year in [2024, 2025, 2026] {
        let d = agg.aggregate(&ScenarioContext::new(PlanId(2), year), &journal, &[]);
        assert!(d.total().is_zero(), "year {year}");
    }
}

#[test]
fn scenario_blank_year_entry_follows_selected_year() {
    let snap = snapshot(&[2025, 2026, 2027]);
    let journal = vec![entry(1, true, None, 7)];
    for year in [2025, 2026, 2027] {
        let ctx = ScenarioContext::new(PlanId(2), year);
        let p = project(
            "POR",
            &ctx,
            14,
            ProjectionInputs {
                snapshot: &snap,
                journal: &journal,
                outputs: &[],
            },
            &settings(14),
            &tables(),
        )
        .unwrap();
        assert_eq!(p.position.mode(Mode::Apron).plan_delta_total, units(7), "year {year}");
    }
}

#[test]
fn scenario_subsystem_outputs_add_to_journal() {
    let outputs = vec![
        SubsystemOutput {
            source: "Trade Lane A".to_string(),
            plan_id: PlanId(2),
            salary_year: 2025,
            include: true,
            delta: PerMode::new(units(5), units(6), units(7)),
        },
        SubsystemOutput {
            source: "Signings".to_string(),
            plan_id: PlanId(2),
            salary_year: 2026,
            include: true,
            delta: PerMode::splat(units(100)),
        },
    ];
    let journal = vec![entry(1, true, Some(2025), 50)];
    let d = DeltaAggregator::default().aggregate(&ScenarioContext::new(PlanId(2), 2025), &journal, &outputs);
    assert_eq!(d.journal_subtotal.cap, units(50));
    assert_eq!(d.subsystem_subtotal, PerMode::new(units(5), units(6), units(7)));
    assert_eq!(d.total().tax, units(56));
    assert_eq!(d.by_source.len(), 1);
    assert_eq!(d.by_action["Trade"].cap, units(50));
}

#[test]
fn scenario_fill_prorated_in_active_year_only() {
    let snap = snapshot(&[2025, 2026]);
    let mut s = settings(14);
    // 3 of 10 days remain
    s.as_of = date(2025, 10, 8);

    let run = |year: i32| {
        project(
            "POR",
            &ScenarioContext::new(PlanId(2), year),
            13,
            ProjectionInputs {
                snapshot: &snap,
                journal: &[],
                outputs: &[],
            },
            &s,
            &tables(),
        )
        .unwrap()
    };

    assert_eq!(run(2025).policy.amount.cap, units(6));
    assert_eq!(run(2026).policy.amount.cap, units(20));
    assert!(run(2026).policy.proration.is_full());
}

#[test]
fn scenario_missing_snapshot_row_is_an_error() {
    let snap = snapshot(&[2025]);
    let err = project(
        "BOS",
        &ScenarioContext::new(PlanId(2), 2025),
        0,
        ProjectionInputs {
            snapshot: &snap,
            journal: &[],
            outputs: &[],
        },
        &settings(0),
        &tables(),
    )
    .unwrap_err();
    assert!(matches!(err, ScenarioError::MissingSnapshotRow { .. }));
}
