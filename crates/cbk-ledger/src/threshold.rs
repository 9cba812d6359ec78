use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{ContractError, Mode, Money};

/// A league threshold a derived total is measured against.
///
/// Each threshold belongs to exactly one [`Mode`]; room is never computed
/// across modes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdKind {
    SalaryCap,
    MinimumTeamSalary,
    TaxLevel,
    FirstApron,
    SecondApron,
}

impl ThresholdKind {
    pub const ALL: [ThresholdKind; 5] = [
        ThresholdKind::SalaryCap,
        ThresholdKind::MinimumTeamSalary,
        ThresholdKind::TaxLevel,
        ThresholdKind::FirstApron,
        ThresholdKind::SecondApron,
    ];

    pub fn mode(self) -> Mode {
        match self {
            ThresholdKind::SalaryCap | ThresholdKind::MinimumTeamSalary => Mode::Cap,
            ThresholdKind::TaxLevel => Mode::Tax,
            ThresholdKind::FirstApron | ThresholdKind::SecondApron => Mode::Apron,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ThresholdKind::SalaryCap => "salary_cap",
            ThresholdKind::MinimumTeamSalary => "minimum_team_salary",
            ThresholdKind::TaxLevel => "tax_level",
            ThresholdKind::FirstApron => "first_apron",
            ThresholdKind::SecondApron => "second_apron",
        }
    }
}

impl std::fmt::Display for ThresholdKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThresholdKind {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        ThresholdKind::ALL
            .into_iter()
            .find(|k| k.as_str() == key)
            .ok_or_else(|| ContractError::UnknownThreshold(s.to_string()))
    }
}

/// Threshold amounts for one salary year.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ThresholdTable {
    amounts: BTreeMap<ThresholdKind, Money>,
}

impl ThresholdTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, kind: ThresholdKind, amount: Money) -> Self {
        self.amounts.insert(kind, amount);
        self
    }

    pub fn insert(&mut self, kind: ThresholdKind, amount: Money) {
        self.amounts.insert(kind, amount);
    }

    pub fn get(&self, kind: ThresholdKind) -> Option<Money> {
        self.amounts.get(&kind).copied()
    }

    /// Thresholds belonging to `mode`, in [`ThresholdKind`] order.
    pub fn for_mode(&self, mode: Mode) -> impl Iterator<Item = (ThresholdKind, Money)> + '_ {
        self.amounts
            .iter()
            .filter(move |(k, _)| k.mode() == mode)
            .map(|(k, v)| (*k, *v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_aprons_belong_to_apron_mode() {
        let t = ThresholdTable::new()
            .with(ThresholdKind::SalaryCap, Money::from_units(140))
            .with(ThresholdKind::FirstApron, Money::from_units(178))
            .with(ThresholdKind::SecondApron, Money::from_units(189));
        let apron: Vec<ThresholdKind> = t.for_mode(Mode::Apron).map(|(k, _)| k).collect();
        assert_eq!(apron, vec![ThresholdKind::FirstApron, ThresholdKind::SecondApron]);
        assert_eq!(t.for_mode(Mode::Tax).count(), 0);
    }

    #[test]
    fn parse_round_trips_every_kind() {
        for k in ThresholdKind::ALL {
            assert_eq!(k.as_str().parse::<ThresholdKind>(), Ok(k));
        }
        assert!(matches!(
            "hard_cap".parse::<ThresholdKind>(),
            Err(ContractError::UnknownThreshold(_))
        ));
    }
}
