//! Action planners: turn per-dimension differences into bucket mutations.
//!
//! The planners never touch bucket storage. They return `{path, action}`
//! pairs and leave application to whoever owns the index (see
//! [`crate::index::GroupedIndex`] for the reference consumer).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, trace};

use crate::diff::{ActionKind, Difference};
use crate::key::{ALL_ISSUES, BucketKey};

/// Where in a one- or two-level index a mutation applies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BucketPath {
    pub group: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_group: Option<String>,
}

impl BucketPath {
    #[must_use]
    pub fn group(group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            sub_group: None,
        }
    }

    #[must_use]
    pub fn nested(group: impl Into<String>, sub_group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            sub_group: Some(sub_group.into()),
        }
    }

    /// Path of the single bucket of an ungrouped index.
    #[must_use]
    pub fn all_issues() -> Self {
        Self::group(ALL_ISSUES)
    }

    /// Number of raw values in the path (1 or 2).
    #[must_use]
    pub const fn depth(&self) -> usize {
        if self.sub_group.is_some() { 2 } else { 1 }
    }

    /// Composed bucket key for this path.
    #[must_use]
    pub fn key(&self) -> BucketKey {
        BucketKey::compose(Some(self.group.as_str()), self.sub_group.as_deref())
    }
}

impl fmt::Display for BucketPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sub_group {
            Some(sub_group) => write!(f, "[{}, {sub_group}]", self.group),
            None => write!(f, "[{}]", self.group),
        }
    }
}

/// One bucket mutation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlannedAction {
    pub path: BucketPath,
    pub action: ActionKind,
}

impl PlannedAction {
    #[must_use]
    pub const fn new(path: BucketPath, action: ActionKind) -> Self {
        Self { path, action }
    }
}

/// Plan mutations for a single grouping dimension.
///
/// Emits one `Add` per added value, then one `Delete` per removed value, in
/// input order and without deduplication.
#[must_use]
pub fn plan_single_dimension<S: AsRef<str>>(add: &[S], delete: &[S]) -> Vec<PlannedAction> {
    let actions: Vec<PlannedAction> = add
        .iter()
        .map(|value| PlannedAction::new(BucketPath::group(value.as_ref()), ActionKind::Add))
        .chain(delete.iter().map(|value| {
            PlannedAction::new(BucketPath::group(value.as_ref()), ActionKind::Delete)
        }))
        .collect();

    debug!(
        adds = add.len(),
        deletes = delete.len(),
        "planned single-dimension actions"
    );
    actions
}

/// Current and previous value lists of one dimension.
#[derive(Debug)]
pub struct DimensionValues<'a, S> {
    pub previous: &'a [S],
    pub current: &'a [S],
}

// Manual impls: only the slices are copied, so `S` needs no bounds.
impl<S> Clone for DimensionValues<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for DimensionValues<'_, S> {}

impl<'a, S> DimensionValues<'a, S> {
    #[must_use]
    pub const fn new(previous: &'a [S], current: &'a [S]) -> Self {
        Self { previous, current }
    }
}

/// Plan mutations for composed group × sub-group buckets.
///
/// Passes, in order:
/// 1. added group × current sub-groups → `Add`
/// 2. removed group × previous sub-groups → `Delete`
/// 3. added sub-group × current groups → `Add`
/// 4. removed sub-group × previous groups → `Delete`
///
/// Actions are keyed by composed [`BucketKey`]; a later pass overwrites an
/// earlier action for the same key but keeps its original position. The
/// result therefore holds at most one action per bucket key.
#[must_use]
pub fn plan_two_dimensions<S: AsRef<str>>(
    group_diff: &Difference,
    sub_group_diff: &Difference,
    groups: DimensionValues<'_, S>,
    sub_groups: DimensionValues<'_, S>,
) -> Vec<PlannedAction> {
    let mut plan = KeyedPlan::default();

    for group in &group_diff.add {
        for sub_group in sub_groups.current {
            plan.record(group, sub_group.as_ref(), ActionKind::Add);
        }
    }
    for group in &group_diff.delete {
        for sub_group in sub_groups.previous {
            plan.record(group, sub_group.as_ref(), ActionKind::Delete);
        }
    }
    for sub_group in &sub_group_diff.add {
        for group in groups.current {
            plan.record(group.as_ref(), sub_group, ActionKind::Add);
        }
    }
    for sub_group in &sub_group_diff.delete {
        for group in groups.previous {
            plan.record(group.as_ref(), sub_group, ActionKind::Delete);
        }
    }

    debug!(
        group_adds = group_diff.add.len(),
        group_deletes = group_diff.delete.len(),
        sub_group_adds = sub_group_diff.add.len(),
        sub_group_deletes = sub_group_diff.delete.len(),
        actions = plan.actions.len(),
        overwritten = plan.overwritten,
        "planned two-dimension actions"
    );
    plan.actions
}

/// Insertion-ordered, key-deduplicated action accumulator.
#[derive(Default)]
struct KeyedPlan {
    actions: Vec<PlannedAction>,
    positions: HashMap<BucketKey, usize>,
    overwritten: usize,
}

impl KeyedPlan {
    fn record(&mut self, group: &str, sub_group: &str, action: ActionKind) {
        let planned = PlannedAction::new(BucketPath::nested(group, sub_group), action);
        let key = planned.path.key();
        trace!(%key, %action, "record bucket action");

        if let Some(&position) = self.positions.get(&key) {
            self.actions[position] = planned;
            self.overwritten += 1;
        } else {
            self.positions.insert(key, self.actions.len());
            self.actions.push(planned);
        }
    }
}
