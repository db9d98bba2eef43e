//! Campaign runner for deterministic simulation campaigns.
//!
//! Executes every seed against every grouping shape, collecting pass/fail
//! results and identifying the first failing seed for replay.

use std::ops::Range;

use anyhow::{Result, bail};
use lanes_core::{DisplayFilters, FilterSpec, Grouping, IssueField};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::workload::MutationMix;
use crate::{SimulationConfig, SimulationResult, Simulator};

/// Campaign-level configuration controlling how many seeds to run and
/// what simulation parameters to use for each seed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignConfig {
    /// Range of seeds to execute, e.g., `0..100`.
    pub seed_range: Range<u64>,
    pub initial_issues: usize,
    pub mutations: usize,
    pub mix: MutationMix,
    /// Run every shape behind a state/priority/date view filter as well.
    pub filtered: bool,
    /// Hide sub-issues in filtered runs.
    pub hide_sub_issues: bool,
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            seed_range: 0..50,
            initial_issues: 12,
            mutations: 48,
            mix: MutationMix::default(),
            filtered: true,
            hide_sub_issues: true,
        }
    }
}

/// Grouping shapes exercised by a campaign: ungrouped, one dimension
/// (single- and multi-valued), two dimensions, and the same without a
/// none bucket.
#[must_use]
pub fn grouping_shapes() -> Vec<Grouping> {
    let with_none = [
        Grouping::ungrouped(),
        Grouping::by(IssueField::State),
        Grouping::by(IssueField::Labels),
        Grouping::by_and_then(IssueField::State, IssueField::Assignees),
        Grouping::by_and_then(IssueField::Labels, IssueField::Assignees),
        Grouping::by_and_then(IssueField::Priority, IssueField::Cycle),
    ];
    let without_none: Vec<Grouping> = with_none
        .iter()
        .skip(1)
        .map(|g| g.clone().with_none_bucket(None))
        .collect();
    with_none.into_iter().chain(without_none).collect()
}

/// Short label for a grouping shape, e.g. `labels>assignees`.
#[must_use]
pub fn describe(grouping: &Grouping) -> String {
    let mut label = match (grouping.group_by, grouping.sub_group_by) {
        (None, _) => "ungrouped".to_string(),
        (Some(group), None) => group.to_string(),
        (Some(group), Some(sub)) => format!("{group}>{sub}"),
    };
    if grouping.depth() > 0 && grouping.none_bucket.is_none() {
        label.push_str(" (no none bucket)");
    }
    label
}

impl CampaignConfig {
    /// Build a [`SimulationConfig`] for a specific seed and shape.
    #[must_use]
    pub fn sim_config_for(&self, seed: u64, grouping: Grouping, filtered: bool) -> SimulationConfig {
        let (filters, display) = if filtered {
            (
                Some(
                    FilterSpec::new()
                        .with("state", ["todo", "doing", "review"])
                        .with("priority", ["urgent", "high", "medium"])
                        .with("target_date", ["2024-01-15;after"]),
                ),
                DisplayFilters {
                    sub_issue: !self.hide_sub_issues,
                },
            )
        } else {
            (None, DisplayFilters::default())
        };
        SimulationConfig {
            seed,
            initial_issues: self.initial_issues,
            mutations: self.mutations,
            mix: self.mix,
            grouping,
            filters,
            display,
            ..SimulationConfig::default()
        }
    }

    /// Validate configuration before running.
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is out of valid range.
    pub fn validate(&self) -> Result<()> {
        if self.seed_range.is_empty() {
            bail!("seed_range must not be empty");
        }
        if self.initial_issues + self.mutations == 0 {
            bail!("a run needs at least one step");
        }
        if self.mix.total() > 100 {
            bail!("mutation mix adds up to {}%", self.mix.total());
        }
        Ok(())
    }

    fn filter_modes(&self) -> &'static [bool] {
        if self.filtered { &[false, true] } else { &[false] }
    }
}

/// Failure details for a single run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedFailure {
    pub seed: u64,
    /// Index into [`grouping_shapes`].
    pub shape: usize,
    pub grouping: String,
    pub filtered: bool,
    pub violations: Vec<String>,
}

/// Aggregate report produced by a campaign run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignReport {
    /// Total runs executed (seeds × shapes × filter modes).
    pub runs: usize,
    pub runs_passed: usize,
    /// First seed that failed (for prioritized replay).
    pub first_failure: Option<u64>,
    pub failures: Vec<SeedFailure>,
    /// Runs in which a step moved an issue along both dimensions at once.
    pub interesting_runs: usize,
    pub actions_planned: usize,
}

impl CampaignReport {
    /// True if every run passed.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Run a full campaign across all seeds and shapes in the config.
///
/// # Errors
///
/// Returns an error if config validation fails or a simulation cannot be
/// constructed.
pub fn run_campaign(config: &CampaignConfig) -> Result<CampaignReport> {
    config.validate()?;

    let shapes = grouping_shapes();
    let mut report = CampaignReport {
        runs: 0,
        runs_passed: 0,
        first_failure: None,
        failures: Vec::new(),
        interesting_runs: 0,
        actions_planned: 0,
    };

    for seed in config.seed_range.clone() {
        for (shape, grouping) in shapes.iter().enumerate() {
            for &filtered in config.filter_modes() {
                let result = run_one(config, seed, grouping.clone(), filtered)?;
                report.runs += 1;
                report.actions_planned += result.actions_planned();
                if result.interesting_state_reached {
                    report.interesting_runs += 1;
                }

                if result.oracle.passed {
                    report.runs_passed += 1;
                } else {
                    report.first_failure = report.first_failure.or(Some(seed));
                    report.failures.push(SeedFailure {
                        seed,
                        shape,
                        grouping: describe(grouping),
                        filtered,
                        violations: result
                            .oracle
                            .violations
                            .iter()
                            .map(ToString::to_string)
                            .collect(),
                    });
                }
            }
        }
    }

    info!(
        runs = report.runs,
        passed = report.runs_passed,
        first_failure = report.first_failure,
        "campaign finished"
    );
    Ok(report)
}

/// Replay one run with its full trace for debugging.
///
/// # Errors
///
/// Returns an error when config validation fails or `shape` is out of
/// range.
pub fn replay_seed(
    seed: u64,
    shape: usize,
    filtered: bool,
    config: &CampaignConfig,
) -> Result<SimulationResult> {
    config.validate()?;
    let shapes = grouping_shapes();
    let Some(grouping) = shapes.get(shape) else {
        bail!("shape {shape} out of range (0..{})", shapes.len());
    };
    run_one(config, seed, grouping.clone(), filtered)
}

fn run_one(
    config: &CampaignConfig,
    seed: u64,
    grouping: Grouping,
    filtered: bool,
) -> Result<SimulationResult> {
    let mut simulator = Simulator::new(config.sim_config_for(seed, grouping, filtered))?;
    simulator.run()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> CampaignConfig {
        CampaignConfig {
            seed_range: 0..4,
            initial_issues: 6,
            mutations: 24,
            ..CampaignConfig::default()
        }
    }

    #[test]
    fn campaign_config_default_is_valid() {
        assert!(CampaignConfig::default().validate().is_ok());
    }

    #[test]
    fn campaign_config_empty_seed_range_rejected() {
        let config = CampaignConfig {
            seed_range: 5..5,
            ..CampaignConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn campaign_config_zero_steps_rejected() {
        let config = CampaignConfig {
            initial_issues: 0,
            mutations: 0,
            ..CampaignConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn shapes_cover_every_depth() {
        let shapes = grouping_shapes();
        for depth in 0..=2 {
            assert!(shapes.iter().any(|g| g.depth() == depth), "depth {depth}");
        }
        assert!(shapes.iter().any(|g| g.none_bucket.is_none()));
    }

    #[test]
    fn describe_names_both_dimensions() {
        let g = Grouping::by_and_then(IssueField::Labels, IssueField::Assignees);
        assert_eq!(describe(&g), "labels>assignees");
        assert_eq!(describe(&Grouping::ungrouped()), "ungrouped");
        assert_eq!(
            describe(&Grouping::by(IssueField::State).with_none_bucket(None)),
            "state (no none bucket)"
        );
    }

    #[test]
    fn run_campaign_all_runs_pass() {
        let config = small();
        let report = run_campaign(&config).expect("campaign should not error");
        assert_eq!(report.runs, 4 * grouping_shapes().len() * 2);
        assert!(
            report.all_passed(),
            "campaign failed: {:?}",
            report.failures.first()
        );
        assert!(report.first_failure.is_none());
        assert!(report.actions_planned > 0);
    }

    #[test]
    fn campaign_reaches_interesting_states() {
        let config = CampaignConfig {
            seed_range: 0..16,
            mutations: 48,
            ..small()
        };
        let report = run_campaign(&config).expect("campaign should not error");
        assert!(
            report.interesting_runs > 0,
            "expected some run to move an issue along both dimensions"
        );
    }

    #[test]
    fn replay_is_deterministic() {
        let config = small();
        let a = replay_seed(7, 3, true, &config).expect("replay 1");
        let b = replay_seed(7, 3, true, &config).expect("replay 2");
        assert_eq!(a, b);
        assert!(!a.trace.is_empty());
    }

    #[test]
    fn replay_rejects_unknown_shape() {
        assert!(replay_seed(0, 999, false, &small()).is_err());
    }

    #[test]
    fn campaign_report_serializes_to_json() {
        let report = CampaignReport {
            runs: 10,
            runs_passed: 9,
            first_failure: Some(7),
            failures: vec![SeedFailure {
                seed: 7,
                shape: 3,
                grouping: "state>assignees".into(),
                filtered: false,
                violations: vec!["IndexDivergence: step 2 (LN-1)".into()],
            }],
            interesting_runs: 5,
            actions_planned: 120,
        };
        let json = serde_json::to_string(&report).expect("serialize");
        assert!(json.contains("\"runs\":10"));
        assert!(json.contains("\"first_failure\":7"));
    }
}
