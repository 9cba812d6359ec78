//! Journal filtering and per-mode delta aggregation for one scenario context.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use cbk_ledger::{JournalEntry, Money, PerMode, PlanId, SalaryYear, ScenarioContext, SubsystemOutput};

/// Group key for journal entries with a blank action type.
pub const UNTYPED_ACTION: &str = "Other";

/// Which plans a journal entry with a blank `plan_id` applies to.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlankPlanScope {
    /// A blank plan applies to every plan.
    #[default]
    AllPlans,
    /// A blank plan applies to no plan.
    NoPlans,
}

/// Selection predicates for journal entries and subsystem outputs.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct JournalFilter {
    pub blank_plan: BlankPlanScope,
}

impl JournalFilter {
    pub fn new(blank_plan: BlankPlanScope) -> Self {
        Self { blank_plan }
    }

    fn plan_matches(&self, ctx: &ScenarioContext, plan_id: Option<PlanId>) -> bool {
        match plan_id {
            Some(p) => p == ctx.plan_id,
            None => self.blank_plan == BlankPlanScope::AllPlans,
        }
    }

    fn year_matches(ctx: &ScenarioContext, year: Option<SalaryYear>) -> bool {
        // Blank year follows whatever year is selected.
        year.map_or(true, |y| y == ctx.salary_year)
    }

    /// Plan and year match, ignoring `enabled`.
    pub fn in_scope(&self, ctx: &ScenarioContext, entry: &JournalEntry) -> bool {
        self.plan_matches(ctx, entry.plan_id) && Self::year_matches(ctx, entry.salary_year)
    }

    /// `enabled AND plan matches AND year matches`.
    pub fn selects(&self, ctx: &ScenarioContext, entry: &JournalEntry) -> bool {
        entry.enabled && self.in_scope(ctx, entry)
    }

    /// `include AND plan_id == P AND salary_year == Y`.  No blank matching.
    pub fn selects_output(&self, ctx: &ScenarioContext, output: &SubsystemOutput) -> bool {
        output.include && output.plan_id == ctx.plan_id && output.salary_year == ctx.salary_year
    }

    /// Selected entries ordered by step; ties keep input order.
    pub fn select<'a>(&self, ctx: &ScenarioContext, journal: &'a [JournalEntry]) -> Vec<&'a JournalEntry> {
        let mut out: Vec<&JournalEntry> = journal.iter().filter(|e| self.selects(ctx, e)).collect();
        out.sort_by_key(|e| e.step);
        out
    }
}

/// Aggregated deltas for one (plan, year).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PlanDeltas {
    pub journal_subtotal: PerMode<Money>,
    pub subsystem_subtotal: PerMode<Money>,
    pub by_action: BTreeMap<String, PerMode<Money>>,
    pub by_source: BTreeMap<String, PerMode<Money>>,
    pub journal_rows: usize,
    pub subsystem_rows: usize,
}

impl PlanDeltas {
    /// `journal_subtotal + subsystem_subtotal`, per mode.
    pub fn total(&self) -> PerMode<Money> {
        self.journal_subtotal + self.subsystem_subtotal
    }
}

/// Journal action counts for a plan diff.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct JournalCounts {
    /// In scope with a non-empty action type, regardless of `enabled`.
    pub total_rows: usize,
    /// Passing the full selection predicate.
    pub enabled_rows: usize,
    pub disabled_rows: usize,
}

#[derive(Copy, Clone, Debug, Default)]
pub struct DeltaAggregator {
    filter: JournalFilter,
}

impl DeltaAggregator {
    pub fn new(filter: JournalFilter) -> Self {
        Self { filter }
    }

    pub fn filter(&self) -> &JournalFilter {
        &self.filter
    }

    pub fn aggregate(
        &self,
        ctx: &ScenarioContext,
        journal: &[JournalEntry],
        outputs: &[SubsystemOutput],
    ) -> PlanDeltas {
        let mut deltas = PlanDeltas::default();

        for entry in self.filter.select(ctx, journal) {
            deltas.journal_subtotal += entry.delta;
            let action = match entry.action_type.trim() {
                "" => UNTYPED_ACTION,
                a => a,
            };
            *deltas.by_action.entry(action.to_string()).or_default() += entry.delta;
            deltas.journal_rows += 1;
        }

        for output in outputs.iter().filter(|o| self.filter.selects_output(ctx, o)) {
            deltas.subsystem_subtotal += output.delta;
            *deltas.by_source.entry(output.source.clone()).or_default() += output.delta;
            deltas.subsystem_rows += 1;
        }

        debug!(
            plan_id = %ctx.plan_id,
            salary_year = ctx.salary_year,
            journal_rows = deltas.journal_rows,
            subsystem_rows = deltas.subsystem_rows,
            "plan deltas aggregated"
        );
        deltas
    }

    pub fn counts(&self, ctx: &ScenarioContext, journal: &[JournalEntry]) -> JournalCounts {
        let typed: Vec<&JournalEntry> = journal
            .iter()
            .filter(|e| !e.action_type.trim().is_empty() && self.filter.in_scope(ctx, e))
            .collect();
        let total_rows = typed.len();
        let enabled_rows = typed.iter().filter(|e| e.enabled).count();
        JournalCounts {
            total_rows,
            enabled_rows,
            disabled_rows: total_rows.saturating_sub(enabled_rows),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(step: u32, plan: Option<u32>, enabled: bool, year: Option<i32>, cap: i64) -> JournalEntry {
        JournalEntry {
            step,
            plan_id: plan.map(PlanId),
            enabled,
            salary_year: year,
            action_type: "Trade".to_string(),
            delta: PerMode::splat(Money::from_units(cap)),
            source_note: String::new(),
        }
    }

    fn ctx(plan: u32, year: i32) -> ScenarioContext {
        ScenarioContext::new(PlanId(plan), year)
    }

    #[test]
    fn disabled_entry_never_selected() {
        let f = JournalFilter::default();
        assert!(!f.selects(&ctx(1, 2025), &entry(1, Some(1), false, Some(2025), 5)));
    }

    #[test]
    fn blank_year_follows_selected_year() {
        let f = JournalFilter::default();
        let e = entry(1, Some(1), true, None, 5);
        for y in [2024, 2025, 2031] {
            assert!(f.selects(&ctx(1, y), &e), "year {y}");
        }
    }

    #[test]
    fn blank_plan_scope_is_configurable() {
        let e = entry(1, None, true, Some(2025), 5);
        assert!(JournalFilter::new(BlankPlanScope::AllPlans).selects(&ctx(7, 2025), &e));
        assert!(!JournalFilter::new(BlankPlanScope::NoPlans).selects(&ctx(7, 2025), &e));
    }

    #[test]
    fn other_plan_and_year_excluded() {
        let f = JournalFilter::default();
        assert!(!f.selects(&ctx(1, 2025), &entry(1, Some(2), true, Some(2025), 5)));
        assert!(!f.selects(&ctx(1, 2025), &entry(1, Some(1), true, Some(2026), 5)));
    }

    #[test]
    fn select_orders_by_step_then_input() {
        let journal = vec![
            entry(3, Some(1), true, None, 1),
            entry(1, Some(1), true, None, 2),
            entry(3, Some(1), true, None, 3),
        ];
        let picked = DeltaAggregator::default()
            .filter()
            .select(&ctx(1, 2025), &journal);
        let caps: Vec<Money> = picked.iter().map(|e| e.delta.cap).collect();
        assert_eq!(
            caps,
            vec![Money::from_units(2), Money::from_units(1), Money::from_units(3)]
        );
    }

    #[test]
    fn output_requires_exact_plan_and_year() {
        let f = JournalFilter::default();
        let out = SubsystemOutput {
            source: "Trade Lane A".to_string(),
            plan_id: PlanId(1),
            salary_year: 2025,
            include: true,
            delta: PerMode::ZERO,
        };
        assert!(f.selects_output(&ctx(1, 2025), &out));
        assert!(!f.selects_output(&ctx(1, 2026), &out));
        assert!(!f.selects_output(&ctx(2, 2025), &SubsystemOutput { include: true, ..out.clone() }));
        assert!(!f.selects_output(&ctx(1, 2025), &SubsystemOutput { include: false, ..out }));
    }

    #[test]
    fn blank_action_grouped_as_other() {
        let mut e = entry(1, Some(1), true, None, 4);
        e.action_type = "  ".to_string();
        let d = DeltaAggregator::default().aggregate(&ctx(1, 2025), &[e], &[]);
        assert_eq!(d.by_action[UNTYPED_ACTION].cap, Money::from_units(4));
    }

    #[test]
    fn counts_ignore_enabled_for_total() {
        let mut untyped = entry(4, Some(1), true, None, 1);
        untyped.action_type.clear();
        let journal = vec![
            entry(1, Some(1), true, None, 1),
            entry(2, Some(1), false, None, 1),
            entry(3, Some(9), true, None, 1),
            untyped,
        ];
        let c = DeltaAggregator::default().counts(&ctx(1, 2025), &journal);
        assert_eq!(
            c,
            JournalCounts {
                total_rows: 2,
                enabled_rows: 1,
                disabled_rows: 1
            }
        );
    }
}
