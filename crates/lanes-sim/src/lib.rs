//! lanes-sim library.
//!
//! Drives a [`GroupedIndex`] through seeded random workloads, feeding it only
//! planner output, and checks it against a full rebuild after every step.
//!
//! # Conventions
//!
//! - **Errors**: Use `anyhow::Result` for return types.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod campaign;
pub mod oracle;
pub mod rng;
pub mod workload;

use std::collections::BTreeMap;

use anyhow::{Result, bail};
use chrono::NaiveDate;
use lanes_core::{
    CompiledFilter, DateContext, DisplayFilters, FilterSpec, GroupedIndex, Grouping, IndexSnapshot,
    IssueSnapshot, PlannedAction, difference,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::oracle::{IndexOracle, OracleResult};
use crate::rng::DeterministicRng;
use crate::workload::{Mutation, MutationMix, Workload, date_origin};

/// Parameters of a single simulation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub seed: u64,
    /// Issues created before the first mutation.
    pub initial_issues: usize,
    pub mutations: usize,
    pub mix: MutationMix,
    pub grouping: Grouping,
    /// View filters; `None` shows every issue.
    pub filters: Option<FilterSpec>,
    pub display: DisplayFilters,
    /// "Today" for relative date filters.
    pub today: NaiveDate,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            initial_issues: 12,
            mutations: 64,
            mix: MutationMix::default(),
            grouping: Grouping::by_and_then(
                lanes_core::IssueField::State,
                lanes_core::IssueField::Assignees,
            ),
            filters: None,
            display: DisplayFilters::default(),
            today: date_origin() + chrono::Days::new(30),
        }
    }
}

impl SimulationConfig {
    /// # Errors
    ///
    /// Returns an error if the mutation mix exceeds 100 percent.
    pub fn validate(&self) -> Result<()> {
        if self.mix.total() > 100 {
            bail!(
                "mutation mix adds up to {}%, must be at most 100%",
                self.mix.total()
            );
        }
        Ok(())
    }
}

/// What one step did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepTrace {
    pub step: usize,
    pub mutation: String,
    pub issue_id: String,
    pub visible_before: bool,
    pub visible_after: bool,
    pub actions: Vec<PlannedAction>,
}

/// Outcome of a simulation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub seed: u64,
    pub grouping: Grouping,
    pub trace: Vec<StepTrace>,
    pub oracle: OracleResult,
    /// Final index contents.
    pub buckets: IndexSnapshot,
    /// A step changed both dimensions of a two-level grouping at once.
    pub interesting_state_reached: bool,
}

impl SimulationResult {
    #[must_use]
    pub fn actions_planned(&self) -> usize {
        self.trace.iter().map(|step| step.actions.len()).sum()
    }
}

/// Deterministic simulation of one view over a mutating issue collection.
pub struct Simulator {
    config: SimulationConfig,
    workload: Workload,
    filter: CompiledFilter,
    index: GroupedIndex,
    board: BTreeMap<String, IssueSnapshot>,
}

impl Simulator {
    /// # Errors
    ///
    /// Returns an error for an invalid config or a malformed date filter.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;

        let ctx = DateContext::fixed(config.today);
        let filter = match &config.filters {
            Some(spec) => CompiledFilter::compile(spec, &config.display, &ctx)?,
            None => CompiledFilter::allow_all(),
        };
        let workload = Workload::new(DeterministicRng::new(config.seed), config.mix);
        let index = GroupedIndex::new(config.grouping.clone());

        Ok(Self {
            config,
            workload,
            filter,
            index,
            board: BTreeMap::new(),
        })
    }

    /// Run all steps, checking the oracle after each.
    ///
    /// Invariant violations land in [`SimulationResult::oracle`]; they are
    /// not errors.
    ///
    /// # Errors
    ///
    /// None at present.
    pub fn run(&mut self) -> Result<SimulationResult> {
        let mut trace = Vec::with_capacity(self.config.initial_issues + self.config.mutations);
        let mut oracle = OracleResult::default();
        let mut interesting = false;

        for step in 0..self.config.initial_issues + self.config.mutations {
            let board: Vec<IssueSnapshot> = self.board.values().cloned().collect();
            let mutation = if step < self.config.initial_issues {
                Mutation::Create {
                    issue: self.workload.new_issue(&board),
                }
            } else {
                self.workload.next_mutation(&board)
            };

            let (record, checks, both_dimensions) = self.apply(step, &mutation);
            interesting |= both_dimensions;
            oracle = oracle.merge(checks);
            trace.push(record);
        }

        if oracle.passed {
            info!(
                seed = self.config.seed,
                steps = trace.len(),
                "simulation passed"
            );
        } else {
            warn!(
                seed = self.config.seed,
                violations = oracle.violations.len(),
                first_step = oracle.violations.first().map(crate::oracle::InvariantViolation::step),
                "simulation found invariant violations"
            );
        }

        Ok(SimulationResult {
            seed: self.config.seed,
            grouping: self.config.grouping.clone(),
            trace,
            oracle,
            buckets: self.index.snapshot(),
            interesting_state_reached: interesting,
        })
    }

    fn apply(&mut self, step: usize, mutation: &Mutation) -> (StepTrace, OracleResult, bool) {
        let id = mutation.issue_id().to_string();
        let previous = self.board.get(&id).cloned();
        let current = match mutation {
            Mutation::Create { issue } | Mutation::Edit { issue, .. } => Some(issue.clone()),
            Mutation::Delete { .. } => None,
            Mutation::Touch { .. } => previous.clone(),
        };

        let shown_before = previous.as_ref().filter(|issue| self.filter.matches(issue));
        let shown_after = current.as_ref().filter(|issue| self.filter.matches(issue));
        let grouping = &self.config.grouping;

        let actions = match (shown_before, shown_after) {
            (None, None) => Vec::new(),
            (None, Some(cur)) => grouping.plan_insert(cur),
            (Some(prev), None) => grouping.plan_remove(prev),
            (Some(prev), Some(cur)) => grouping.reconcile(prev, cur),
        };
        let both_dimensions = match (shown_before, shown_after) {
            (Some(prev), Some(cur)) => changes_both_dimensions(grouping, prev, cur),
            _ => false,
        };

        let record = StepTrace {
            step,
            mutation: mutation.kind().to_string(),
            issue_id: id.clone(),
            visible_before: shown_before.is_some(),
            visible_after: shown_after.is_some(),
            actions: actions.clone(),
        };
        debug!(
            step,
            kind = mutation.kind(),
            issue = %id,
            actions = actions.len(),
            "simulation step"
        );

        match current {
            Some(issue) => {
                self.board.insert(id.clone(), issue);
            }
            None => {
                self.board.remove(&id);
            }
        }

        let mut checks = IndexOracle::check_unique_keys(step, &id, &actions);
        if matches!(mutation, Mutation::Touch { .. }) {
            checks = checks.merge(IndexOracle::check_noop(step, &id, &actions));
        }
        if let Err(err) = self.index.apply(&id, &actions) {
            checks = checks.merge(IndexOracle::apply_rejected(step, &id, err.to_string()));
        }
        let board: Vec<IssueSnapshot> = self.board.values().cloned().collect();
        checks = checks.merge(IndexOracle::check_rebuild(
            step,
            &id,
            &self.index,
            &self.filter,
            &board,
        ));

        (record, checks, both_dimensions)
    }
}

fn changes_both_dimensions(grouping: &Grouping, prev: &IssueSnapshot, cur: &IssueSnapshot) -> bool {
    let (Some(group_by), Some(sub_group_by)) = (grouping.group_by, grouping.sub_group_by) else {
        return false;
    };
    let changed = |field| {
        !difference(
            &grouping.values(field, cur),
            &grouping.values(field, prev),
            None,
        )
        .is_empty()
    };
    changed(group_by) && changed(sub_group_by)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lanes_core::IssueField;

    fn config(grouping: Grouping) -> SimulationConfig {
        SimulationConfig {
            seed: 17,
            grouping,
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn default_config_is_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn oversized_mix_is_rejected() {
        let config = SimulationConfig {
            mix: MutationMix {
                create_percent: 60,
                delete_percent: 30,
                touch_percent: 20,
            },
            ..SimulationConfig::default()
        };
        assert!(Simulator::new(config).is_err());
    }

    #[test]
    fn malformed_filter_is_rejected() {
        let config = SimulationConfig {
            filters: Some(FilterSpec::new().with("target_date", ["soon"])),
            ..SimulationConfig::default()
        };
        assert!(Simulator::new(config).is_err());
    }

    #[test]
    fn every_grouping_depth_passes() {
        for grouping in [
            Grouping::ungrouped(),
            Grouping::by(IssueField::Labels),
            Grouping::by_and_then(IssueField::State, IssueField::Assignees),
        ] {
            let mut sim = Simulator::new(config(grouping)).expect("valid config");
            let result = sim.run().expect("run");
            assert!(result.oracle.passed, "{:?}", result.oracle.violations);
            assert_eq!(result.trace.len(), 12 + 64);
        }
    }

    #[test]
    fn filtered_view_passes() {
        let config = SimulationConfig {
            filters: Some(
                FilterSpec::new()
                    .with("state", ["todo", "doing"])
                    .with("target_date", ["2024-01-20;after"]),
            ),
            display: DisplayFilters { sub_issue: false },
            ..config(Grouping::by_and_then(IssueField::Labels, IssueField::Module))
        };
        let result = Simulator::new(config).expect("valid").run().expect("run");
        assert!(result.oracle.passed, "{:?}", result.oracle.violations);
        assert!(result.trace.iter().any(|s| s.visible_before != s.visible_after));
    }

    #[test]
    fn touches_plan_nothing() {
        let config = SimulationConfig {
            mix: MutationMix {
                create_percent: 0,
                delete_percent: 0,
                touch_percent: 100,
            },
            ..config(Grouping::by(IssueField::Assignees))
        };
        let result = Simulator::new(config).expect("valid").run().expect("run");
        assert!(
            result
                .trace
                .iter()
                .filter(|s| s.mutation == "touch")
                .all(|s| s.actions.is_empty())
        );
    }

    #[test]
    fn runs_are_deterministic() {
        let grouping = Grouping::by_and_then(IssueField::Priority, IssueField::Labels);
        let a = Simulator::new(config(grouping.clone())).expect("valid").run().expect("run");
        let b = Simulator::new(config(grouping)).expect("valid").run().expect("run");
        assert_eq!(a, b);
    }
}
