//! Roster-fill policy.
//!
//! When a roster is short of its target, each missing slot is assumed to be
//! filled at a league minimum salary.  In the active salary year the amount
//! is prorated by the share of the season still remaining.

use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use cbk_ledger::{Money, PerMode, SalaryYear};

use crate::ScenarioError;

/// Which minimum salary a fill slot is charged at.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillType {
    RookieMin,
    #[default]
    VetMin,
    /// The lesser of the rookie and veteran minimums.
    LesserOfBoth,
}

impl FillType {
    pub fn as_str(self) -> &'static str {
        match self {
            FillType::RookieMin => "rookie_min",
            FillType::VetMin => "vet_min",
            FillType::LesserOfBoth => "lesser_of_both",
        }
    }
}

impl std::fmt::Display for FillType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FillType {
    type Err = String;

    /// Accepts snake names and the workbook labels ("Rookie Min", "Vet Min", ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match norm.as_str() {
            "rookie_min" => Ok(FillType::RookieMin),
            "vet_min" => Ok(FillType::VetMin),
            "lesser_of_both" | "lesser" | "min_of_both" => Ok(FillType::LesserOfBoth),
            _ => Err(format!("unknown fill type '{s}'")),
        }
    }
}

/// The year's minimum salaries, supplied as data.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinimumScale {
    pub rookie_min: Money,
    pub vet_min: Money,
}

impl MinimumScale {
    pub fn unit_salary(&self, fill_type: FillType) -> Money {
        match fill_type {
            FillType::RookieMin => self.rookie_min,
            FillType::VetMin => self.vet_min,
            FillType::LesserOfBoth => self.rookie_min.min(self.vet_min),
        }
    }
}

// ---------------------------------------------------------------------------
// Season calendar / proration
// ---------------------------------------------------------------------------

/// First and last day of the regular season, inclusive.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonCalendar {
    first_day: NaiveDate,
    last_day: NaiveDate,
}

impl SeasonCalendar {
    pub fn new(first_day: NaiveDate, last_day: NaiveDate) -> Result<Self, ScenarioError> {
        if last_day < first_day {
            return Err(ScenarioError::InvalidSeason {
                first: first_day,
                last: last_day,
            });
        }
        Ok(Self { first_day, last_day })
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first_day
    }

    pub fn last_day(&self) -> NaiveDate {
        self.last_day
    }

    pub fn total_days(&self) -> i64 {
        (self.last_day - self.first_day).num_days() + 1
    }

    /// Days from `as_of` through the last day, inclusive, clamped to
    /// `[0, total_days]`.
    pub fn remaining_days(&self, as_of: NaiveDate) -> i64 {
        ((self.last_day - as_of).num_days() + 1).clamp(0, self.total_days())
    }
}

/// `remaining_days / total_days` kept as an exact ratio.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Proration {
    pub remaining_days: i64,
    pub total_days: i64,
}

impl Proration {
    pub const FULL: Proration = Proration {
        remaining_days: 1,
        total_days: 1,
    };

    /// Full for every year except `active_year`, where the remaining share
    /// of the season as of `as_of` applies.
    pub fn for_year(
        year: SalaryYear,
        active_year: SalaryYear,
        calendar: &SeasonCalendar,
        as_of: NaiveDate,
    ) -> Self {
        if year != active_year {
            return Proration::FULL;
        }
        Proration {
            remaining_days: calendar.remaining_days(as_of),
            total_days: calendar.total_days(),
        }
    }

    pub fn is_full(&self) -> bool {
        self.remaining_days == self.total_days
    }

    /// Rounds half away from zero.
    pub fn apply(&self, amount: Money) -> Option<Money> {
        amount.prorate(self.remaining_days, self.total_days)
    }
}

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterFillPolicy {
    /// 0 disables the policy.
    pub target: u32,
    #[serde(default)]
    pub fill_type: FillType,
}

/// Policy contribution to a derived position.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PolicyDelta {
    pub fill_count: u32,
    pub fill_type: FillType,
    pub unit_salary: Money,
    pub proration: Proration,
    /// Same amount in every mode.
    pub amount: PerMode<Money>,
}

impl RosterFillPolicy {
    pub fn new(target: u32, fill_type: FillType) -> Self {
        Self { target, fill_type }
    }

    /// `max(0, target - current)`.
    pub fn fill_count(&self, current_roster: u32) -> u32 {
        self.target.saturating_sub(current_roster)
    }

    pub fn evaluate(
        &self,
        current_roster: u32,
        scale: &MinimumScale,
        proration: Proration,
    ) -> Result<PolicyDelta, ScenarioError> {
        let fill_count = self.fill_count(current_roster);
        let unit_salary = scale.unit_salary(self.fill_type);
        let amount = unit_salary
            .checked_mul_count(i64::from(fill_count))
            .and_then(|gross| proration.apply(gross))
            .ok_or(ScenarioError::FillOverflow { fill_count })?;
        Ok(PolicyDelta {
            fill_count,
            fill_type: self.fill_type,
            unit_salary,
            proration,
            amount: PerMode::splat(amount),
        })
    }
}
