//! Scenario: full runs from wire rows, partitioned runs, malformed rows.
//!
//! # Invariants under test
//!
//! 1. Any partition count produces the same summaries as the sequential run,
//!    including the order of the sample list.
//! 2. A malformed row is skipped and recorded; the rest of the batch is still
//!    reconciled and a complete summary is returned.  Amounts too large to
//!    sum safely are malformed.
//! 3. Snapshot row errors appear in both summaries, drilldown row errors only
//!    in the drilldown summary.
//! 4. Drilldown keys without a snapshot row are counted, never checked.

use cbk_reconcile::*;
use serde_json::json;

fn bundle(teams: usize) -> String {
    let mut snapshot = Vec::new();
    let mut book = Vec::new();
    for i in 0..teams {
        let team = format!("T{i:02}");
        // every 4th team carries a bucket error in cap; every 7th a drilldown gap
        let cap_total = if i % 4 == 1 { 101 } else { 100 };
        snapshot.push(json!({
            "team_code": team, "salary_year": 2025,
            "cap_total": cap_total, "cap_rost": 60, "cap_fa": 20, "cap_term": 15, "cap_2way": 5,
            "tax_total": 100, "tax_rost": 100,
            "apron_total": 100, "apron_rost": 100
        }));
        let amount = if i % 7 == 2 { 90 } else { 100 };
        book.push(json!({
            "team_code": team, "salary_year": 2025,
            "cap_amount": amount, "tax_amount": amount, "apron_amount": amount
        }));
    }
    json!({
        "snapshot": snapshot,
        "drilldowns": [{"source": "salary_book", "rows": book}]
    })
    .to_string()
}

#[test]
fn scenario_partitioned_run_matches_sequential() {
    let input = normalize_json(&bundle(37)).unwrap();
    let sequential = reconcile_input(&input, 1).unwrap();
    assert!(!sequential.passed());

    for partitions in [2, 3, 4, 8, 37, 100] {
        let parallel = reconcile_input(&input, partitions).unwrap();
        assert_eq!(parallel, sequential, "partitions={partitions}");
        assert_eq!(parallel.report(), sequential.report());
    }
}

#[test]
fn scenario_malformed_rows_skipped_and_recorded() {
    let json = json!({
        "snapshot": [
            {"team_code": "POR", "salary_year": 2025, "cap_total": 10, "cap_rost": 10},
            {"team_code": "", "salary_year": 2025, "cap_total": 10},
            {"team_code": "BOS", "cap_total": 10}
        ],
        "drilldowns": [
            {"source": "salary_book", "rows": [
                {"team_code": "POR", "salary_year": 2025, "cap_amount": 10},
                {"team_code": "POR", "salary_year": "soon", "cap_amount": 10}
            ]}
        ]
    })
    .to_string();
    let input = normalize_json(&json).unwrap();
    assert_eq!(input.snapshot.len(), 1);
    assert_eq!(input.snapshot_errors.len(), 2);
    assert_eq!(input.drilldown_errors.len(), 1);

    let run = reconcile_input(&input, 1).unwrap();
    assert!(run.passed());
    assert_eq!(run.buckets.total_checks(), 3);
    assert_eq!(run.buckets.skipped_rows().len(), 2);
    assert_eq!(run.drilldowns.skipped_rows().len(), 3);
    assert_eq!(run.skipped_rows(), 3);

    let report = run.report();
    assert_eq!(report.drilldowns.skipped_rows[2].table, "salary_book");
    assert_eq!(report.buckets.skipped_rows[0].index, 1);
}

#[test]
fn scenario_oversized_amounts_skipped_without_aborting_run() {
    let json = json!({
        "snapshot": [
            {"team_code": "POR", "salary_year": 2025, "cap_total": 1e17, "cap_rost": 5e16, "cap_fa": 5e16},
            {"team_code": "BOS", "salary_year": 2025, "cap_total": 80, "cap_rost": 80}
        ],
        "drilldowns": [
            {"source": "salary_book", "rows": [
                {"team_code": "POR", "salary_year": 2025, "cap_amount": 5e16},
                {"team_code": "POR", "salary_year": 2025, "cap_amount": 5e16},
                {"team_code": "BOS", "salary_year": 2025, "cap_amount": 80}
            ]}
        ]
    })
    .to_string();
    let input = normalize_json(&json).unwrap();
    assert_eq!(input.snapshot.len(), 1);
    assert_eq!(input.snapshot_errors.len(), 1);
    assert_eq!(input.drilldown_errors.len(), 2);

    for partitions in [1, 2] {
        let run = reconcile_input(&input, partitions).unwrap();
        assert!(run.passed());
        assert_eq!(run.buckets.total_checks(), 3);
        assert_eq!(run.drilldowns.total_checks(), 3);
        assert_eq!(run.skipped_rows(), 3);
        assert!(matches!(
            run.buckets.skipped_rows()[0].reason,
            RowErrorReason::InvalidAmount { .. }
        ));
    }
}

#[test]
fn scenario_orphan_drilldown_keys_counted() {
    let json = json!({
        "snapshot": [{"team_code": "POR", "salary_year": 2025}],
        "drilldowns": [
            {"source": "cap_holds", "rows": [
                {"team_code": "SEA", "salary_year": 2025, "cap_amount": 3},
                {"team_code": "POR", "salary_year": 2026, "cap_amount": 3}
            ]}
        ]
    })
    .to_string();
    let run = reconcile_input(&normalize_json(&json).unwrap(), 1).unwrap();
    assert_eq!(run.orphan_drilldown_keys, 2);
    assert_eq!(run.drilldowns.total_checks(), 3);
    assert!(run.passed());
}

#[test]
fn scenario_unknown_source_aborts_normalization() {
    let json = json!({
        "snapshot": [],
        "drilldowns": [{"source": "exceptions", "rows": []}]
    })
    .to_string();
    assert!(normalize_json(&json).is_err());
}
