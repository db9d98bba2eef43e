//! In-memory grouped index: a reference consumer of planned actions.
//!
//! Buckets hold issue ids in insertion order without duplicates. The shape
//! follows the grouping depth: a flat list, one level of groups, or groups
//! of sub-groups.

use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, trace};

use crate::diff::ActionKind;
use crate::key::BucketKey;
use crate::model::IssueSnapshot;
use crate::plan::{BucketPath, PlannedAction};
use crate::reconcile::Grouping;

/// Errors from applying actions to a [`GroupedIndex`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexError {
    /// The path depth does not match the index shape.
    #[error("bucket path {path} does not fit an index of depth {depth}")]
    PathShape {
        /// The offending path.
        path: BucketPath,
        /// Grouping depth of the index (0 = ungrouped).
        depth: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Buckets {
    Ungrouped(Vec<String>),
    Grouped(BTreeMap<String, Vec<String>>),
    SubGrouped(BTreeMap<String, BTreeMap<String, Vec<String>>>),
}

/// Comparable view of an index: bucket key → member ids.
pub type IndexSnapshot = BTreeMap<BucketKey, BTreeSet<String>>;

/// Grouped issue ids for one view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupedIndex {
    grouping: Grouping,
    buckets: Buckets,
}

impl GroupedIndex {
    /// An index with no issues.
    #[must_use]
    pub fn new(grouping: Grouping) -> Self {
        let buckets = match grouping.depth() {
            0 => Buckets::Ungrouped(Vec::new()),
            1 => Buckets::Grouped(BTreeMap::new()),
            _ => Buckets::SubGrouped(BTreeMap::new()),
        };
        Self { grouping, buckets }
    }

    /// Build the index from scratch, without going through the planners.
    #[must_use]
    pub fn rebuild(grouping: Grouping, issues: &[IssueSnapshot]) -> Self {
        let mut index = Self::new(grouping);
        for issue in issues {
            index.place(issue);
        }
        debug!(
            issues = issues.len(),
            buckets = index.bucket_count(),
            "rebuilt grouped index"
        );
        index
    }

    fn place(&mut self, issue: &IssueSnapshot) {
        let id = issue.id.as_str();
        let groups = self
            .grouping
            .group_by
            .map(|field| self.grouping.values(field, issue))
            .unwrap_or_default();
        let sub_groups = self
            .grouping
            .sub_group_by
            .map(|field| self.grouping.values(field, issue))
            .unwrap_or_default();

        match &mut self.buckets {
            Buckets::Ungrouped(ids) => insert_id(ids, id),
            Buckets::Grouped(map) => {
                for group in groups {
                    insert_id(map.entry(group).or_default(), id);
                }
            }
            Buckets::SubGrouped(map) => {
                for group in groups {
                    let inner = map.entry(group).or_default();
                    for sub_group in &sub_groups {
                        insert_id(inner.entry(sub_group.clone()).or_default(), id);
                    }
                }
            }
        }
    }

    #[must_use]
    pub const fn grouping(&self) -> &Grouping {
        &self.grouping
    }

    /// Apply planned actions for one issue.
    ///
    /// Every path is checked before anything is mutated, so a failed call
    /// leaves the index untouched.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::PathShape`] if a path does not fit this index.
    pub fn apply(&mut self, issue_id: &str, actions: &[PlannedAction]) -> Result<(), IndexError> {
        let depth = self.grouping.depth();
        if let Some(bad) = actions.iter().find(|a| !self.fits(&a.path)) {
            return Err(IndexError::PathShape {
                path: bad.path.clone(),
                depth,
            });
        }

        for action in actions {
            trace!(issue = issue_id, path = %action.path, kind = %action.action, "apply");
            let bucket = self.bucket_mut(&action.path, action.action);
            match (action.action, bucket) {
                (ActionKind::Add, Some(ids)) => insert_id(ids, issue_id),
                (ActionKind::Delete, Some(ids)) => ids.retain(|id| id != issue_id),
                (_, None) => {}
            }
        }
        Ok(())
    }

    fn fits(&self, path: &BucketPath) -> bool {
        match &self.buckets {
            Buckets::Ungrouped(_) => *path == BucketPath::all_issues(),
            Buckets::Grouped(_) => path.depth() == 1,
            Buckets::SubGrouped(_) => path.depth() == 2,
        }
    }

    /// Bucket for a path; created on `Add`, looked up on `Delete`.
    fn bucket_mut(&mut self, path: &BucketPath, kind: ActionKind) -> Option<&mut Vec<String>> {
        let create = kind == ActionKind::Add;
        match &mut self.buckets {
            Buckets::Ungrouped(ids) => Some(ids),
            Buckets::Grouped(map) => {
                if create {
                    Some(map.entry(path.group.clone()).or_default())
                } else {
                    map.get_mut(&path.group)
                }
            }
            Buckets::SubGrouped(map) => {
                let sub_group = path.sub_group.as_ref()?;
                if create {
                    Some(
                        map.entry(path.group.clone())
                            .or_default()
                            .entry(sub_group.clone())
                            .or_default(),
                    )
                } else {
                    map.get_mut(&path.group)?.get_mut(sub_group)
                }
            }
        }
    }

    /// Plan and apply the insertion of a new issue.
    ///
    /// # Errors
    ///
    /// Propagates [`IndexError`] from [`Self::apply`].
    pub fn insert(&mut self, issue: &IssueSnapshot) -> Result<Vec<PlannedAction>, IndexError> {
        let actions = self.grouping.plan_insert(issue);
        self.apply(&issue.id, &actions)?;
        Ok(actions)
    }

    /// Plan and apply the removal of an issue.
    ///
    /// # Errors
    ///
    /// Propagates [`IndexError`] from [`Self::apply`].
    pub fn remove(&mut self, issue: &IssueSnapshot) -> Result<Vec<PlannedAction>, IndexError> {
        let actions = self.grouping.plan_remove(issue);
        self.apply(&issue.id, &actions)?;
        Ok(actions)
    }

    /// Plan and apply an update from `previous` to `current`.
    ///
    /// # Errors
    ///
    /// Propagates [`IndexError`] from [`Self::apply`].
    pub fn update(
        &mut self,
        previous: &IssueSnapshot,
        current: &IssueSnapshot,
    ) -> Result<Vec<PlannedAction>, IndexError> {
        let actions = self.grouping.reconcile(previous, current);
        self.apply(&current.id, &actions)?;
        Ok(actions)
    }

    /// Member ids of the bucket at `path`, in insertion order.
    #[must_use]
    pub fn bucket(&self, path: &BucketPath) -> Option<&[String]> {
        match &self.buckets {
            Buckets::Ungrouped(ids) => (*path == BucketPath::all_issues()).then_some(ids.as_slice()),
            Buckets::Grouped(map) => map.get(&path.group).map(Vec::as_slice),
            Buckets::SubGrouped(map) => map
                .get(&path.group)?
                .get(path.sub_group.as_ref()?)
                .map(Vec::as_slice),
        }
    }

    /// Number of leaf buckets, including empty ones.
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        match &self.buckets {
            Buckets::Ungrouped(_) => 1,
            Buckets::Grouped(map) => map.len(),
            Buckets::SubGrouped(map) => map.values().map(BTreeMap::len).sum(),
        }
    }

    /// Non-empty buckets keyed by composed bucket key.
    #[must_use]
    pub fn snapshot(&self) -> IndexSnapshot {
        let mut out = IndexSnapshot::new();
        let mut put = |key: BucketKey, ids: &[String]| {
            if !ids.is_empty() {
                out.entry(key).or_default().extend(ids.iter().cloned());
            }
        };

        match &self.buckets {
            Buckets::Ungrouped(ids) => put(BucketKey::all_issues(), ids),
            Buckets::Grouped(map) => {
                for (group, ids) in map {
                    put(BucketKey::compose(Some(group.as_str()), None), ids);
                }
            }
            Buckets::SubGrouped(map) => {
                for (group, inner) in map {
                    for (sub_group, ids) in inner {
                        put(BucketKey::compose(Some(group.as_str()), Some(sub_group.as_str())), ids);
                    }
                }
            }
        }
        out
    }
}

fn insert_id(ids: &mut Vec<String>, id: &str) {
    if !ids.iter().any(|existing| existing == id) {
        ids.push(id.to_string());
    }
}
