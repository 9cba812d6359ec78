use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Bucket, ContractError, Mode, Money, PerMode};

/// Salary year (season start year, e.g. 2025 for 2025-26).
pub type SalaryYear = i32;

/// Identity of a ledger row and the join key for drilldowns.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TeamYear {
    pub team_code: String,
    pub salary_year: SalaryYear,
}

impl TeamYear {
    pub fn new(team_code: impl Into<String>, salary_year: SalaryYear) -> Self {
        Self {
            team_code: team_code.into(),
            salary_year,
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// One mode's headline total and its four contribution buckets.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ModeLedger {
    pub total: Money,
    /// Indexed by [`Bucket::index`].
    pub buckets: [Money; 4],
}

impl ModeLedger {
    pub fn new(total: Money, buckets: [Money; 4]) -> Self {
        Self { total, buckets }
    }

    pub fn bucket(&self, bucket: Bucket) -> Money {
        self.buckets[bucket.index()]
    }

    pub fn bucket_sum(&self) -> Money {
        self.buckets.iter().sum()
    }
}

/// Authoritative per-team, per-year summary row (the ledger snapshot).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LedgerRow {
    pub team_code: String,
    pub salary_year: SalaryYear,
    pub modes: PerMode<ModeLedger>,
}

impl LedgerRow {
    pub fn new(team_code: impl Into<String>, salary_year: SalaryYear) -> Self {
        Self {
            team_code: team_code.into(),
            salary_year,
            modes: PerMode::default(),
        }
    }

    /// Builder: set one mode's total and buckets (roster, fa, term, 2way).
    pub fn with_mode(mut self, mode: Mode, total: Money, buckets: [Money; 4]) -> Self {
        self.modes[mode] = ModeLedger::new(total, buckets);
        self
    }

    pub fn key(&self) -> TeamYear {
        TeamYear::new(self.team_code.clone(), self.salary_year)
    }

    pub fn mode(&self, mode: Mode) -> &ModeLedger {
        &self.modes[mode]
    }

    /// Headline totals per mode.
    pub fn totals(&self) -> PerMode<Money> {
        self.modes.map(|_, l| l.total)
    }
}

// ---------------------------------------------------------------------------
// Drilldowns
// ---------------------------------------------------------------------------

/// Source table a drilldown record comes from.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrilldownSource {
    /// Active-contract salary book.
    SalaryBook,
    /// Free-agent cap holds.
    CapHolds,
    /// Dead money (terminated contracts).
    DeadMoney,
}

impl DrilldownSource {
    pub const ALL: [DrilldownSource; 3] = [
        DrilldownSource::SalaryBook,
        DrilldownSource::CapHolds,
        DrilldownSource::DeadMoney,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DrilldownSource::SalaryBook => "salary_book",
            DrilldownSource::CapHolds => "cap_holds",
            DrilldownSource::DeadMoney => "dead_money",
        }
    }
}

impl std::fmt::Display for DrilldownSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DrilldownSource {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "salary_book" | "salary_book_yearly" => Ok(DrilldownSource::SalaryBook),
            "cap_holds" | "cap_holds_warehouse" => Ok(DrilldownSource::CapHolds),
            "dead_money" | "dead_money_warehouse" => Ok(DrilldownSource::DeadMoney),
            _ => Err(ContractError::UnknownSource(s.to_string())),
        }
    }
}

/// One detailed contributing record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DrilldownRecord {
    pub source: DrilldownSource,
    pub team_code: String,
    pub salary_year: SalaryYear,
    pub amount: PerMode<Money>,
}

impl DrilldownRecord {
    pub fn new(
        source: DrilldownSource,
        team_code: impl Into<String>,
        salary_year: SalaryYear,
        amount: PerMode<Money>,
    ) -> Self {
        Self {
            source,
            team_code: team_code.into(),
            salary_year,
            amount,
        }
    }

    pub fn key(&self) -> TeamYear {
        TeamYear::new(self.team_code.clone(), self.salary_year)
    }
}

// ---------------------------------------------------------------------------
// Scenario inputs
// ---------------------------------------------------------------------------

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanId(pub u32);

impl std::fmt::Display for PlanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named scenario.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub plan_id: PlanId,
    pub name: String,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

/// One hypothetical action in a plan journal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct JournalEntry {
    /// Position in the analyst's ordered list.
    pub step: u32,
    /// `None` = blank.
    pub plan_id: Option<PlanId>,
    pub enabled: bool,
    /// `None` = blank, i.e. "the currently selected year".
    pub salary_year: Option<SalaryYear>,
    pub action_type: String,
    pub delta: PerMode<Money>,
    pub source_note: String,
}

/// A delta row published by an external subsystem (trade lanes, signings, ...).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SubsystemOutput {
    pub source: String,
    pub plan_id: PlanId,
    pub salary_year: SalaryYear,
    pub include: bool,
    pub delta: PerMode<Money>,
}

/// The selected (plan, year) a scenario is evaluated for.
///
/// Passed explicitly into every aggregation so one engine can evaluate several
/// scenarios side by side.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ScenarioContext {
    pub plan_id: PlanId,
    pub salary_year: SalaryYear,
}

impl ScenarioContext {
    pub fn new(plan_id: PlanId, salary_year: SalaryYear) -> Self {
        Self {
            plan_id,
            salary_year,
        }
    }
}
