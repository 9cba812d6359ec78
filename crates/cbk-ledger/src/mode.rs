//! Accounting modes, contribution buckets and the per-mode container.
//!
//! Every computation that used to be written three times (cap / tax / apron)
//! is written once over [`Mode`] and stored in a [`PerMode`].

use std::ops::{Add, AddAssign, Index, IndexMut};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{ContractError, Money};

/// One of the three parallel accounting measures.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Primary cap measure.
    Cap,
    /// Secondary tax measure.
    Tax,
    /// Hard-ceiling apron measure.
    Apron,
}

impl Mode {
    /// Canonical iteration order.
    pub const ALL: [Mode; 3] = [Mode::Cap, Mode::Tax, Mode::Apron];

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Cap => "cap",
            Mode::Tax => "tax",
            Mode::Apron => "apron",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cap" => Ok(Mode::Cap),
            "tax" => Ok(Mode::Tax),
            "apron" => Ok(Mode::Apron),
            _ => Err(ContractError::UnknownMode(s.to_string())),
        }
    }
}

/// Contribution category that sums to a mode's total.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Roster,
    FreeAgentHold,
    /// Terminated contracts (dead money).
    Terminated,
    TwoWay,
}

impl Bucket {
    pub const ALL: [Bucket; 4] = [
        Bucket::Roster,
        Bucket::FreeAgentHold,
        Bucket::Terminated,
        Bucket::TwoWay,
    ];

    /// Position inside [`crate::ModeLedger::buckets`].
    pub fn index(self) -> usize {
        match self {
            Bucket::Roster => 0,
            Bucket::FreeAgentHold => 1,
            Bucket::Terminated => 2,
            Bucket::TwoWay => 3,
        }
    }

    /// Warehouse column suffix (`cap_rost`, `tax_2way`, ...).
    pub fn suffix(self) -> &'static str {
        match self {
            Bucket::Roster => "rost",
            Bucket::FreeAgentHold => "fa",
            Bucket::Terminated => "term",
            Bucket::TwoWay => "2way",
        }
    }
}

impl FromStr for Bucket {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rost" | "roster" => Ok(Bucket::Roster),
            "fa" | "free_agent_hold" => Ok(Bucket::FreeAgentHold),
            "term" | "terminated" => Ok(Bucket::Terminated),
            "2way" | "two_way" => Ok(Bucket::TwoWay),
            _ => Err(ContractError::UnknownBucket(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// PerMode
// ---------------------------------------------------------------------------

/// One value per [`Mode`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerMode<T> {
    pub cap: T,
    pub tax: T,
    pub apron: T,
}

impl<T> PerMode<T> {
    pub fn new(cap: T, tax: T, apron: T) -> Self {
        Self { cap, tax, apron }
    }

    /// Build by evaluating `f` once per mode, in [`Mode::ALL`] order.
    pub fn from_fn<F: FnMut(Mode) -> T>(mut f: F) -> Self {
        let cap = f(Mode::Cap);
        let tax = f(Mode::Tax);
        let apron = f(Mode::Apron);
        Self { cap, tax, apron }
    }

    pub fn get(&self, mode: Mode) -> &T {
        match mode {
            Mode::Cap => &self.cap,
            Mode::Tax => &self.tax,
            Mode::Apron => &self.apron,
        }
    }

    pub fn get_mut(&mut self, mode: Mode) -> &mut T {
        match mode {
            Mode::Cap => &mut self.cap,
            Mode::Tax => &mut self.tax,
            Mode::Apron => &mut self.apron,
        }
    }

    pub fn map<U, F: FnMut(Mode, &T) -> U>(&self, mut f: F) -> PerMode<U> {
        PerMode::from_fn(|m| f(m, self.get(m)))
    }

    /// Combine two containers mode by mode.
    pub fn zip_with<U, V, F: FnMut(Mode, &T, &U) -> V>(&self, other: &PerMode<U>, mut f: F) -> PerMode<V> {
        PerMode::from_fn(|m| f(m, self.get(m), other.get(m)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Mode, &T)> + '_ {
        Mode::ALL.into_iter().map(move |m| (m, self.get(m)))
    }
}

impl<T: Clone> PerMode<T> {
    /// Same value for every mode.
    pub fn splat(value: T) -> Self {
        Self {
            cap: value.clone(),
            tax: value.clone(),
            apron: value,
        }
    }
}

impl PerMode<Money> {
    pub const ZERO: PerMode<Money> = PerMode {
        cap: Money::ZERO,
        tax: Money::ZERO,
        apron: Money::ZERO,
    };

    pub fn is_zero(&self) -> bool {
        self.iter().all(|(_, m)| m.is_zero())
    }
}

impl<T> Index<Mode> for PerMode<T> {
    type Output = T;
    fn index(&self, mode: Mode) -> &T {
        self.get(mode)
    }
}

impl<T> IndexMut<Mode> for PerMode<T> {
    fn index_mut(&mut self, mode: Mode) -> &mut T {
        self.get_mut(mode)
    }
}

impl Add for PerMode<Money> {
    type Output = PerMode<Money>;
    fn add(self, rhs: PerMode<Money>) -> PerMode<Money> {
        PerMode::from_fn(|m| self[m] + rhs[m])
    }
}

impl AddAssign for PerMode<Money> {
    fn add_assign(&mut self, rhs: PerMode<Money>) {
        for m in Mode::ALL {
            self[m] += rhs[m];
        }
    }
}
