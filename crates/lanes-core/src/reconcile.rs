//! Reconciliation front door: pick the planner for the configured grouping
//! depth and feed it the issue's previous and current dimension values.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::diff::{ActionKind, difference};
use crate::model::{IssueField, IssueSnapshot};
use crate::plan::{
    BucketPath, DimensionValues, PlannedAction, plan_single_dimension, plan_two_dimensions,
};

/// Placeholder bucket for issues with no value on a dimension.
pub const DEFAULT_NONE_BUCKET: &str = "None";

/// Which attributes drive the group and sub-group dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grouping {
    pub group_by: Option<IssueField>,
    pub sub_group_by: Option<IssueField>,
    /// Bucket that collects issues with no value on a dimension. With
    /// `None`, such issues sit in no bucket of that dimension.
    #[serde(default = "default_none_bucket")]
    pub none_bucket: Option<String>,
}

fn default_none_bucket() -> Option<String> {
    Some(DEFAULT_NONE_BUCKET.to_string())
}

impl Default for Grouping {
    fn default() -> Self {
        Self::ungrouped()
    }
}

impl Grouping {
    #[must_use]
    pub fn ungrouped() -> Self {
        Self {
            group_by: None,
            sub_group_by: None,
            none_bucket: default_none_bucket(),
        }
    }

    #[must_use]
    pub fn by(group_by: IssueField) -> Self {
        Self {
            group_by: Some(group_by),
            ..Self::ungrouped()
        }
    }

    #[must_use]
    pub fn by_and_then(group_by: IssueField, sub_group_by: IssueField) -> Self {
        Self {
            group_by: Some(group_by),
            sub_group_by: Some(sub_group_by),
            ..Self::ungrouped()
        }
    }

    #[must_use]
    pub fn with_none_bucket(mut self, none_bucket: Option<String>) -> Self {
        self.none_bucket = none_bucket;
        self
    }

    /// Number of grouping dimensions in effect (0, 1 or 2).
    ///
    /// A sub-group without a group is ignored.
    #[must_use]
    pub const fn depth(&self) -> usize {
        match (self.group_by, self.sub_group_by) {
            (None, _) => 0,
            (Some(_), None) => 1,
            (Some(_), Some(_)) => 2,
        }
    }

    /// Values an issue contributes to the dimension backed by `field`.
    #[must_use]
    pub fn values(&self, field: IssueField, issue: &IssueSnapshot) -> Vec<String> {
        let values = field.value(issue).dimension_values();
        match &self.none_bucket {
            Some(none) if values.is_empty() => vec![none.clone()],
            _ => values,
        }
    }

    fn dimensions(&self, issue: &IssueSnapshot) -> (Vec<String>, Vec<String>) {
        let groups = self
            .group_by
            .map(|field| self.values(field, issue))
            .unwrap_or_default();
        let sub_groups = self
            .sub_group_by
            .map(|field| self.values(field, issue))
            .unwrap_or_default();
        (groups, sub_groups)
    }

    /// Bucket mutations for an issue whose fields changed.
    ///
    /// Ungrouped views never move issues between buckets, so they yield no
    /// actions.
    #[must_use]
    pub fn reconcile(&self, previous: &IssueSnapshot, current: &IssueSnapshot) -> Vec<PlannedAction> {
        let (prev_groups, prev_subs) = self.dimensions(previous);
        let (cur_groups, cur_subs) = self.dimensions(current);

        let actions = if self.depth() == 0 {
            Vec::new()
        } else {
            self.plan(
                DimensionValues::new(&prev_groups, &cur_groups),
                DimensionValues::new(&prev_subs, &cur_subs),
            )
        };

        debug!(
            issue = %current.id,
            depth = self.depth(),
            actions = actions.len(),
            "reconciled issue"
        );
        actions
    }

    /// Bucket mutations placing a new issue into every bucket it occupies.
    #[must_use]
    pub fn plan_insert(&self, issue: &IssueSnapshot) -> Vec<PlannedAction> {
        self.plan_whole(issue, ActionKind::Add)
    }

    /// Bucket mutations removing a deleted issue from every bucket it occupied.
    #[must_use]
    pub fn plan_remove(&self, issue: &IssueSnapshot) -> Vec<PlannedAction> {
        self.plan_whole(issue, ActionKind::Delete)
    }

    /// An insert is a change from "no values" and a removal a change to
    /// "no values".
    fn plan_whole(&self, issue: &IssueSnapshot, kind: ActionKind) -> Vec<PlannedAction> {
        if self.depth() == 0 {
            return vec![PlannedAction::new(BucketPath::all_issues(), kind)];
        }

        let (groups, sub_groups) = self.dimensions(issue);
        let (prev_groups, cur_groups) = sides(kind, &groups);
        let (prev_subs, cur_subs) = sides(kind, &sub_groups);

        self.plan(
            DimensionValues::new(prev_groups, cur_groups),
            DimensionValues::new(prev_subs, cur_subs),
        )
    }

    fn plan(
        &self,
        groups: DimensionValues<'_, String>,
        sub_groups: DimensionValues<'_, String>,
    ) -> Vec<PlannedAction> {
        let group_diff = difference(groups.current, groups.previous, None);
        if self.depth() == 1 {
            return plan_single_dimension(&group_diff.add, &group_diff.delete);
        }

        let sub_diff = difference(sub_groups.current, sub_groups.previous, None);
        plan_two_dimensions(&group_diff, &sub_diff, groups, sub_groups)
    }
}

/// (previous, current) lists for an insert (`Add`) or removal (`Delete`).
fn sides(kind: ActionKind, values: &[String]) -> (&[String], &[String]) {
    match kind {
        ActionKind::Add => (&[], values),
        ActionKind::Delete => (values, &[]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn with_assignees(ids: &[&str]) -> IssueSnapshot {
        IssueSnapshot {
            assignee_ids: ids.iter().map(|s| (*s).to_string()).collect(),
            state_id: Some("todo".into()),
            ..IssueSnapshot::new("I1")
        }
    }

    #[test]
    fn partial_json_grouping_keeps_the_none_bucket() {
        let grouping: Grouping =
            serde_json::from_str(r#"{"group_by":"state"}"#).expect("deserialize");
        assert_eq!(grouping, Grouping::by(IssueField::State));

        let explicit: Grouping =
            serde_json::from_str(r#"{"group_by":"state","none_bucket":null}"#)
                .expect("deserialize");
        assert_eq!(explicit.none_bucket, None);
    }

    #[test]
    fn new_assignee_adds_one_bucket() {
        let grouping = Grouping::by(IssueField::Assignees);
        let actions = grouping.reconcile(&with_assignees(&["u1"]), &with_assignees(&["u1", "u2"]));
        assert_eq!(
            actions,
            vec![PlannedAction::new(BucketPath::group("u2"), ActionKind::Add)]
        );
    }

    #[test]
    fn ungrouped_updates_do_nothing() {
        let grouping = Grouping::ungrouped();
        let actions = grouping.reconcile(&with_assignees(&["u1"]), &with_assignees(&["u2"]));
        assert!(actions.is_empty());
        assert_eq!(grouping.depth(), 0);
    }

    #[test]
    fn losing_the_last_value_moves_into_none_bucket() {
        let grouping = Grouping::by(IssueField::Assignees);
        let actions = grouping.reconcile(&with_assignees(&["u1"]), &with_assignees(&[]));
        assert_eq!(
            actions,
            vec![
                PlannedAction::new(BucketPath::group(DEFAULT_NONE_BUCKET), ActionKind::Add),
                PlannedAction::new(BucketPath::group("u1"), ActionKind::Delete),
            ]
        );
    }

    #[test]
    fn without_none_bucket_empty_values_occupy_nothing() {
        let grouping = Grouping::by(IssueField::Assignees).with_none_bucket(None);
        let actions = grouping.reconcile(&with_assignees(&["u1"]), &with_assignees(&[]));
        assert_eq!(
            actions,
            vec![PlannedAction::new(BucketPath::group("u1"), ActionKind::Delete)]
        );
    }

    #[test]
    fn two_dimension_state_change_moves_across_every_assignee() {
        let grouping = Grouping::by_and_then(IssueField::State, IssueField::Assignees);
        let previous = with_assignees(&["u1", "u2"]);
        let current = IssueSnapshot {
            state_id: Some("done".into()),
            ..previous.clone()
        };

        let actions: HashSet<PlannedAction> =
            grouping.reconcile(&previous, &current).into_iter().collect();
        assert_eq!(
            actions,
            HashSet::from([
                PlannedAction::new(BucketPath::nested("done", "u1"), ActionKind::Add),
                PlannedAction::new(BucketPath::nested("done", "u2"), ActionKind::Add),
                PlannedAction::new(BucketPath::nested("todo", "u1"), ActionKind::Delete),
                PlannedAction::new(BucketPath::nested("todo", "u2"), ActionKind::Delete),
            ])
        );
    }

    #[test]
    fn insert_covers_the_full_cross_product_once() {
        let grouping = Grouping::by_and_then(IssueField::State, IssueField::Assignees);
        let actions = grouping.plan_insert(&with_assignees(&["u1", "u2", "u1"]));
        let paths: HashSet<BucketPath> = actions.iter().map(|a| a.path.clone()).collect();
        assert_eq!(actions.len(), 2);
        assert_eq!(
            paths,
            HashSet::from([
                BucketPath::nested("todo", "u1"),
                BucketPath::nested("todo", "u2"),
            ])
        );
        assert!(actions.iter().all(|a| a.action == ActionKind::Add));
    }

    #[test]
    fn remove_mirrors_insert() {
        let grouping = Grouping::by_and_then(IssueField::State, IssueField::Assignees);
        let issue = with_assignees(&["u1"]);
        let removed = grouping.plan_remove(&issue);
        assert_eq!(
            removed,
            vec![PlannedAction::new(BucketPath::nested("todo", "u1"), ActionKind::Delete)]
        );
    }

    #[test]
    fn ungrouped_insert_targets_all_issues() {
        let actions = Grouping::ungrouped().plan_insert(&with_assignees(&[]));
        assert_eq!(
            actions,
            vec![PlannedAction::new(BucketPath::all_issues(), ActionKind::Add)]
        );
    }

    #[test]
    fn sub_group_without_group_is_ungrouped() {
        let grouping = Grouping {
            group_by: None,
            sub_group_by: Some(IssueField::Labels),
            none_bucket: None,
        };
        assert_eq!(grouping.depth(), 0);
    }
}
