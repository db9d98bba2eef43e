use std::collections::{BTreeSet, HashSet};

use lanes_core::{BucketKey, CompiledFilter, GroupedIndex, IndexSnapshot, IssueSnapshot, PlannedAction};
use serde::{Deserialize, Serialize};

// ── Core result types ─────────────────────────────────────────────────────────

/// Outcome of one or more invariant checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleResult {
    /// `true` iff no violations were found.
    pub passed: bool,
    pub violations: Vec<InvariantViolation>,
}

impl OracleResult {
    #[must_use]
    const fn pass() -> Self {
        Self {
            passed: true,
            violations: Vec::new(),
        }
    }

    #[must_use]
    fn fail(violation: InvariantViolation) -> Self {
        Self {
            passed: false,
            violations: vec![violation],
        }
    }

    /// Merge another result into this one (failures accumulate).
    #[must_use]
    pub fn merge(mut self, other: Self) -> Self {
        if !other.passed {
            self.passed = false;
            self.violations.extend(other.violations);
        }
        self
    }
}

impl Default for OracleResult {
    fn default() -> Self {
        Self::pass()
    }
}

// ── Invariant violation diagnostics ──────────────────────────────────────────

/// Diagnostic information for a single failed invariant check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "invariant", rename_all = "snake_case")]
pub enum InvariantViolation {
    /// The incrementally maintained index differs from a fresh rebuild.
    IndexDivergence {
        step: usize,
        issue_id: String,
        /// `key:id` memberships the rebuild has but the index lacks.
        missing: Vec<String>,
        /// `key:id` memberships the index has but the rebuild lacks.
        unexpected: Vec<String>,
    },

    /// One action list addressed the same bucket twice.
    DuplicateBucketKey {
        step: usize,
        issue_id: String,
        key: BucketKey,
    },

    /// Re-saving an unchanged issue planned bucket mutations.
    NoOpPlannedActions {
        step: usize,
        issue_id: String,
        actions: usize,
    },

    /// The index refused a planned action.
    ApplyRejected {
        step: usize,
        issue_id: String,
        message: String,
    },
}

impl InvariantViolation {
    #[must_use]
    pub const fn step(&self) -> usize {
        match self {
            Self::IndexDivergence { step, .. }
            | Self::DuplicateBucketKey { step, .. }
            | Self::NoOpPlannedActions { step, .. }
            | Self::ApplyRejected { step, .. } => *step,
        }
    }
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IndexDivergence {
                step,
                issue_id,
                missing,
                unexpected,
            } => write!(
                f,
                "IndexDivergence: step {step} ({issue_id}) \
                 (missing={missing:?}, unexpected={unexpected:?})"
            ),
            Self::DuplicateBucketKey {
                step,
                issue_id,
                key,
            } => write!(
                f,
                "DuplicateBucketKey: step {step} ({issue_id}) addressed '{key}' twice"
            ),
            Self::NoOpPlannedActions {
                step,
                issue_id,
                actions,
            } => write!(
                f,
                "NoOpPlannedActions: step {step} ({issue_id}) planned {actions} actions for an unchanged issue"
            ),
            Self::ApplyRejected {
                step,
                issue_id,
                message,
            } => write!(f, "ApplyRejected: step {step} ({issue_id}): {message}"),
        }
    }
}

// ── Oracle ───────────────────────────────────────────────────────────────────

/// Checks the index invariants after each simulated mutation.
pub struct IndexOracle;

impl IndexOracle {
    /// The index must hold exactly what a rebuild from the visible issues
    /// would hold.
    #[must_use]
    pub fn check_rebuild(
        step: usize,
        issue_id: &str,
        index: &GroupedIndex,
        filter: &CompiledFilter,
        board: &[IssueSnapshot],
    ) -> OracleResult {
        let visible: Vec<IssueSnapshot> = board
            .iter()
            .filter(|issue| filter.matches(issue))
            .cloned()
            .collect();
        let rebuilt = GroupedIndex::rebuild(index.grouping().clone(), &visible);

        let actual = memberships(&index.snapshot());
        let expected = memberships(&rebuilt.snapshot());
        if actual == expected {
            return OracleResult::pass();
        }

        OracleResult::fail(InvariantViolation::IndexDivergence {
            step,
            issue_id: issue_id.to_string(),
            missing: expected.difference(&actual).cloned().collect(),
            unexpected: actual.difference(&expected).cloned().collect(),
        })
    }

    /// An action list holds at most one action per bucket key.
    #[must_use]
    pub fn check_unique_keys(step: usize, issue_id: &str, actions: &[PlannedAction]) -> OracleResult {
        let mut seen = HashSet::new();
        actions
            .iter()
            .map(|action| action.path.key())
            .filter(|key| !seen.insert(key.clone()))
            .map(|key| {
                OracleResult::fail(InvariantViolation::DuplicateBucketKey {
                    step,
                    issue_id: issue_id.to_string(),
                    key,
                })
            })
            .fold(OracleResult::pass(), OracleResult::merge)
    }

    /// A mutation that changed nothing plans nothing.
    #[must_use]
    pub fn check_noop(step: usize, issue_id: &str, actions: &[PlannedAction]) -> OracleResult {
        if actions.is_empty() {
            return OracleResult::pass();
        }
        OracleResult::fail(InvariantViolation::NoOpPlannedActions {
            step,
            issue_id: issue_id.to_string(),
            actions: actions.len(),
        })
    }

    #[must_use]
    pub fn apply_rejected(step: usize, issue_id: &str, message: String) -> OracleResult {
        OracleResult::fail(InvariantViolation::ApplyRejected {
            step,
            issue_id: issue_id.to_string(),
            message,
        })
    }
}

fn memberships(snapshot: &IndexSnapshot) -> BTreeSet<String> {
    snapshot
        .iter()
        .flat_map(|(key, ids)| ids.iter().map(move |id| format!("{key}:{id}")))
        .collect()
}
