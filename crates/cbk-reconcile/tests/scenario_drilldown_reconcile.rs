//! Scenario: drilldown-level reconciliation.
//!
//! # Invariants under test
//!
//! 1. Records sharing a (team_code, salary_year) key accumulate: 100 + 50
//!    yields actual = 150.
//! 2. Amounts from all supplied tables add up into one actual per mode.
//! 3. Differences below one currency unit pass; one unit or more fails.
//! 4. A snapshot row with no drilldown records is compared against zero.
//! 5. Missing, duplicate or misfiled tables are contract errors with no
//!    summary produced.
//!
//! All tests are pure; no IO.

use cbk_ledger::{
    buckets_units, ContractError, DrilldownRecord, DrilldownSource, LedgerRow, Mode, Money, PerMode,
};
use cbk_reconcile::*;

fn row(team: &str, total: Money) -> LedgerRow {
    let mut r = LedgerRow::new(team, 2025);
    for m in Mode::ALL {
        r = r.with_mode(m, total, buckets_units(0, 0, 0, 0));
    }
    r
}

fn rec(source: DrilldownSource, team: &str, amount: Money) -> DrilldownRecord {
    DrilldownRecord::new(source, team, 2025, PerMode::splat(amount))
}

fn units(n: i64) -> Money {
    Money::from_units(n)
}

#[test]
fn scenario_records_sharing_a_key_accumulate() {
    let table = DrilldownTable::new(
        DrilldownSource::SalaryBook,
        vec![
            rec(DrilldownSource::SalaryBook, "POR", units(100)),
            rec(DrilldownSource::SalaryBook, "POR", units(50)),
        ],
    );
    let s = reconcile_drilldowns(&[row("POR", units(150))], &[table]).unwrap();
    assert!(s.passed());
    assert_eq!(s.sample_checks()[0].actual, units(150));
    assert_eq!(s.sample_checks()[0].check_name, "cap_drilldown");
}

#[test]
fn scenario_three_tables_sum_into_one_actual() {
    let tables = vec![
        DrilldownTable::new(
            DrilldownSource::SalaryBook,
            vec![rec(DrilldownSource::SalaryBook, "POR", units(80))],
        ),
        DrilldownTable::new(
            DrilldownSource::CapHolds,
            vec![rec(DrilldownSource::CapHolds, "POR", units(15))],
        ),
        DrilldownTable::new(
            DrilldownSource::DeadMoney,
            vec![rec(DrilldownSource::DeadMoney, "POR", units(5))],
        ),
    ];
    let s = reconcile_drilldowns(&[row("POR", units(100))], &tables).unwrap();
    assert!(s.passed());
    assert_eq!(s.total_checks(), 3);
}

#[test]
fn scenario_sub_unit_rounding_is_tolerated() {
    let table = DrilldownTable::new(
        DrilldownSource::SalaryBook,
        vec![rec(DrilldownSource::SalaryBook, "POR", Money::from_minor(99_01))],
    );
    let s = reconcile_drilldowns(&[row("POR", units(100))], std::slice::from_ref(&table)).unwrap();
    assert!(s.passed());
    assert_eq!(s.sample_checks()[0].delta, Money::from_minor(99));

    let s = reconcile_drilldowns(&[row("POR", units(101))], &[table]).unwrap();
    assert!(!s.passed());
    assert_eq!(s.failed_checks(), 3);
}

#[test]
fn scenario_row_without_records_compares_against_zero() {
    let table = DrilldownTable::new(DrilldownSource::CapHolds, vec![]);
    let s = reconcile_drilldowns(&[row("POR", units(7))], &[table]).unwrap();
    assert_eq!(s.failed_checks(), 3);
    assert_eq!(s.all_failures()[0].actual, Money::ZERO);
    assert_eq!(s.all_failures()[0].delta, units(7));
}

#[test]
fn scenario_contract_errors_produce_no_summary() {
    let rows = [row("POR", units(1))];
    assert_eq!(
        reconcile_drilldowns(&rows, &[]),
        Err(ContractError::NoDrilldownTables)
    );

    let t = DrilldownTable::new(DrilldownSource::DeadMoney, vec![]);
    assert_eq!(
        reconcile_drilldowns(&rows, &[t.clone(), t]),
        Err(ContractError::DuplicateSource(DrilldownSource::DeadMoney))
    );
}
