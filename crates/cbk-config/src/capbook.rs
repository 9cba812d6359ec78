//! Typed view of the merged configuration document.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use cbk_ledger::{Money, SalaryYear, ThresholdKind, ThresholdTable};
use cbk_scenario::{
    BlankPlanScope, JournalFilter, MinimumScale, ProjectionSettings, RosterFillPolicy,
    SeasonCalendar, YearTables,
};

use crate::LoadedConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapbookConfig {
    #[serde(default)]
    pub reconcile: ReconcileSection,
    pub scenario: Option<ScenarioSection>,
    #[serde(default)]
    pub roster_fill: RosterFillPolicy,
    #[serde(default)]
    pub years: BTreeMap<SalaryYear, YearSection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileSection {
    #[serde(default = "default_partitions")]
    pub partitions: usize,
}

impl Default for ReconcileSection {
    fn default() -> Self {
        Self {
            partitions: default_partitions(),
        }
    }
}

fn default_partitions() -> usize {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioSection {
    pub active_year: SalaryYear,
    pub as_of: NaiveDate,
    #[serde(default)]
    pub blank_plan_id: BlankPlanScope,
    pub season: SeasonSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonSection {
    pub first_day: NaiveDate,
    pub last_day: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearSection {
    /// Keyed by threshold name; validated in [`CapbookConfig::year_tables`].
    #[serde(default)]
    pub thresholds: BTreeMap<String, Money>,
    pub minimums: Option<MinimumScale>,
}

impl CapbookConfig {
    pub fn from_json(config_json: &serde_json::Value) -> Result<Self> {
        let cfg: CapbookConfig = serde_json::from_value(config_json.clone())
            .context("config does not match the capbook schema")?;
        // Surface bad threshold names at load time rather than at first use.
        for (year, section) in &cfg.years {
            section
                .threshold_table()
                .with_context(|| format!("years.{year}.thresholds"))?;
        }
        Ok(cfg)
    }

    pub fn from_loaded(loaded: &LoadedConfig) -> Result<Self> {
        Self::from_json(&loaded.config_json)
    }

    pub fn projection_settings(&self) -> Result<ProjectionSettings> {
        let scenario = self
            .scenario
            .as_ref()
            .context("config is missing the `scenario` section")?;
        let season = SeasonCalendar::new(scenario.season.first_day, scenario.season.last_day)
            .context("scenario.season")?;
        Ok(ProjectionSettings {
            filter: JournalFilter::new(scenario.blank_plan_id),
            roster_fill: self.roster_fill,
            active_year: scenario.active_year,
            as_of: scenario.as_of,
            season,
        })
    }

    pub fn year_tables(&self, year: SalaryYear) -> Result<YearTables> {
        let section = self
            .years
            .get(&year)
            .with_context(|| format!("no league tables configured for {year}"))?;
        let thresholds = section
            .threshold_table()
            .with_context(|| format!("years.{year}.thresholds"))?;
        let minimums = match section.minimums {
            Some(m) => m,
            // Without a fill target the minimums are never read.
            None if self.roster_fill.target == 0 => MinimumScale {
                rookie_min: Money::ZERO,
                vet_min: Money::ZERO,
            },
            None => anyhow::bail!("years.{year}.minimums is required when roster_fill.target > 0"),
        };
        Ok(YearTables {
            thresholds,
            minimums,
        })
    }
}

impl YearSection {
    pub fn threshold_table(&self) -> Result<ThresholdTable> {
        let mut table = ThresholdTable::new();
        for (name, amount) in &self.thresholds {
            let kind: ThresholdKind = name.parse()?;
            table.insert(kind, *amount);
        }
        Ok(table)
    }
}
