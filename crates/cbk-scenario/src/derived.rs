use std::collections::BTreeMap;

use serde::Serialize;

use cbk_ledger::{Mode, Money, PerMode, PlanId, SalaryYear, ThresholdKind, ThresholdTable};

/// One mode's projected position.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ModePosition {
    pub snapshot_total: Money,
    pub plan_delta_total: Money,
    pub policy_delta_total: Money,
    pub derived_total: Money,
    /// `threshold - derived_total` for every threshold of this mode.
    /// Non-negative is room under the threshold, negative is the amount over.
    pub room_by_threshold: BTreeMap<ThresholdKind, Money>,
}

impl ModePosition {
    pub fn room(&self, kind: ThresholdKind) -> Option<Money> {
        self.room_by_threshold.get(&kind).copied()
    }

    pub fn is_over(&self, kind: ThresholdKind) -> Option<bool> {
        self.room(kind).map(Money::is_negative)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DerivedPosition {
    pub team_code: String,
    pub salary_year: SalaryYear,
    pub plan_id: PlanId,
    #[serde(flatten)]
    pub modes: PerMode<ModePosition>,
}

impl DerivedPosition {
    pub fn mode(&self, mode: Mode) -> &ModePosition {
        &self.modes[mode]
    }
}

/// Snapshot + plan delta + policy delta, measured against the year's
/// thresholds.  A threshold only ever applies to its own mode.
#[derive(Clone, Copy, Debug)]
pub struct DerivedStateCalculator<'a> {
    thresholds: &'a ThresholdTable,
}

impl<'a> DerivedStateCalculator<'a> {
    pub fn new(thresholds: &'a ThresholdTable) -> Self {
        Self { thresholds }
    }

    pub fn derive_modes(
        &self,
        snapshot: &PerMode<Money>,
        plan_delta: &PerMode<Money>,
        policy_delta: &PerMode<Money>,
    ) -> PerMode<ModePosition> {
        PerMode::from_fn(|mode| {
            let derived_total = snapshot[mode] + plan_delta[mode] + policy_delta[mode];
            let room_by_threshold = self
                .thresholds
                .for_mode(mode)
                .map(|(kind, value)| (kind, value - derived_total))
                .collect();
            ModePosition {
                snapshot_total: snapshot[mode],
                plan_delta_total: plan_delta[mode],
                policy_delta_total: policy_delta[mode],
                derived_total,
                room_by_threshold,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn units(n: i64) -> Money {
        Money::from_units(n)
    }

    #[test]
    fn derived_total_and_room() {
        let table = ThresholdTable::new().with(ThresholdKind::SalaryCap, units(600));
        let modes = DerivedStateCalculator::new(&table).derive_modes(
            &PerMode::splat(units(500)),
            &PerMode::splat(units(50)),
            &PerMode::splat(units(20)),
        );
        assert_eq!(modes.cap.derived_total, units(570));
        assert_eq!(modes.cap.room(ThresholdKind::SalaryCap), Some(units(30)));
        assert_eq!(modes.cap.is_over(ThresholdKind::SalaryCap), Some(false));
    }

    #[test]
    fn thresholds_never_cross_modes() {
        let table = ThresholdTable::new()
            .with(ThresholdKind::SalaryCap, units(100))
            .with(ThresholdKind::TaxLevel, units(200))
            .with(ThresholdKind::FirstApron, units(300))
            .with(ThresholdKind::SecondApron, units(400));
        let modes = DerivedStateCalculator::new(&table).derive_modes(
            &PerMode::new(units(10), units(20), units(30)),
            &PerMode::ZERO,
            &PerMode::ZERO,
        );
        assert_eq!(modes.cap.room_by_threshold.len(), 1);
        assert_eq!(modes.tax.room(ThresholdKind::TaxLevel), Some(units(180)));
        assert_eq!(modes.tax.room(ThresholdKind::SalaryCap), None);
        assert_eq!(modes.apron.room(ThresholdKind::FirstApron), Some(units(270)));
        assert_eq!(modes.apron.room(ThresholdKind::SecondApron), Some(units(370)));
    }

    #[test]
    fn over_threshold_is_negative_room() {
        let table = ThresholdTable::new().with(ThresholdKind::TaxLevel, units(100));
        let modes = DerivedStateCalculator::new(&table).derive_modes(
            &PerMode::splat(units(90)),
            &PerMode::splat(units(15)),
            &PerMode::ZERO,
        );
        assert_eq!(modes.tax.room(ThresholdKind::TaxLevel), Some(units(-5)));
        assert_eq!(modes.tax.is_over(ThresholdKind::TaxLevel), Some(true));
    }

    #[test]
    fn minimum_team_salary_is_a_cap_threshold() {
        let table = ThresholdTable::new()
            .with(ThresholdKind::SalaryCap, units(150))
            .with(ThresholdKind::MinimumTeamSalary, units(130));
        let modes = DerivedStateCalculator::new(&table).derive_modes(
            &PerMode::splat(units(120)),
            &PerMode::ZERO,
            &PerMode::ZERO,
        );
        assert_eq!(modes.cap.room(ThresholdKind::MinimumTeamSalary), Some(units(10)));
        assert_eq!(modes.cap.room(ThresholdKind::SalaryCap), Some(units(30)));
    }
}
