use lanes_core::{
    ActionKind, BucketKey, Difference, DimensionValues, GroupedIndex, Grouping, IssueSnapshot,
    difference, plan_two_dimensions,
};
use proptest::prelude::*;
use std::collections::HashSet;

use generators::*;

fn set(values: &[String]) -> HashSet<&str> {
    values.iter().map(String::as_str).collect()
}

fn only(diff: &Difference, kind: ActionKind) -> Difference {
    match kind {
        ActionKind::Add => Difference {
            add: diff.add.clone(),
            delete: Vec::new(),
        },
        ActionKind::Delete => Difference {
            add: Vec::new(),
            delete: diff.delete.clone(),
        },
    }
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(512))]

    #[test]
    fn difference_partitions_the_symmetric_difference(
        current in arb_values(),
        previous in arb_values(),
    ) {
        let diff = difference(&current, &previous, None);
        let cur = set(&current);
        let prev = set(&previous);

        prop_assert_eq!(set(&diff.add), cur.difference(&prev).copied().collect::<HashSet<_>>());
        prop_assert_eq!(set(&diff.delete), prev.difference(&cur).copied().collect::<HashSet<_>>());
        prop_assert!(set(&diff.add).is_disjoint(&set(&diff.delete)));
        prop_assert_eq!(diff.add.len(), set(&diff.add).len());
        prop_assert_eq!(diff.delete.len(), set(&diff.delete).len());
    }

    #[test]
    fn restricted_difference_matches_the_full_one(
        current in arb_values(),
        previous in arb_values(),
    ) {
        let full = difference(&current, &previous, None);
        let adds = difference(&current, &previous, Some(ActionKind::Add));
        let deletes = difference(&current, &previous, Some(ActionKind::Delete));

        prop_assert_eq!(set(&adds.add), set(&full.add));
        prop_assert!(adds.delete.is_empty());
        prop_assert_eq!(set(&deletes.delete), set(&full.delete));
        prop_assert!(deletes.add.is_empty());
    }

    #[test]
    fn unchanged_issue_plans_nothing(grouping in arb_grouping(), issue in arb_issue("I".into())) {
        prop_assert!(grouping.reconcile(&issue, &issue).is_empty());
    }

    #[test]
    fn two_dimension_plan_has_one_action_per_key(
        prev_groups in arb_values(),
        cur_groups in arb_values(),
        prev_subs in arb_values(),
        cur_subs in arb_values(),
    ) {
        let group_diff = difference(&cur_groups, &prev_groups, None);
        let sub_diff = difference(&cur_subs, &prev_subs, None);
        let actions = plan_two_dimensions(
            &group_diff,
            &sub_diff,
            DimensionValues::new(&prev_groups, &cur_groups),
            DimensionValues::new(&prev_subs, &cur_subs),
        );

        let keys: Vec<BucketKey> = actions.iter().map(|a| a.path.key()).collect();
        let unique: HashSet<&BucketKey> = keys.iter().collect();
        prop_assert_eq!(keys.len(), unique.len());
    }

    /// Add-derived and delete-derived actions never target the same key, so
    /// the pass order of the keyed accumulator cannot change the outcome.
    #[test]
    fn add_and_delete_passes_never_share_a_key(
        prev_groups in arb_values(),
        cur_groups in arb_values(),
        prev_subs in arb_values(),
        cur_subs in arb_values(),
    ) {
        let group_diff = difference(&cur_groups, &prev_groups, None);
        let sub_diff = difference(&cur_subs, &prev_subs, None);
        let groups = DimensionValues::new(prev_groups.as_slice(), cur_groups.as_slice());
        let subs = DimensionValues::new(prev_subs.as_slice(), cur_subs.as_slice());

        let add_keys: HashSet<BucketKey> = plan_two_dimensions(
            &only(&group_diff, ActionKind::Add),
            &only(&sub_diff, ActionKind::Add),
            groups,
            subs,
        )
        .iter()
        .map(|a| a.path.key())
        .collect();
        let delete_keys: HashSet<BucketKey> = plan_two_dimensions(
            &only(&group_diff, ActionKind::Delete),
            &only(&sub_diff, ActionKind::Delete),
            groups,
            subs,
        )
        .iter()
        .map(|a| a.path.key())
        .collect();

        prop_assert!(add_keys.is_disjoint(&delete_keys));
    }

    #[test]
    fn incremental_updates_match_a_rebuild(
        grouping in arb_grouping(),
        (issues, updates) in arb_issues(6).prop_flat_map(|issues| {
            let n = issues.len();
            let updates = prop::collection::vec(
                (0..n).prop_flat_map(|i| arb_issue(format!("I{i}")).prop_map(move |issue| (i, issue))),
                0..12,
            );
            (Just(issues), updates)
        }),
    ) {
        let mut state: Vec<IssueSnapshot> = issues.clone();
        let mut index = GroupedIndex::rebuild(grouping.clone(), &issues);

        for (position, next) in updates {
            let previous = std::mem::replace(&mut state[position], next);
            index.update(&previous, &state[position]).expect("paths fit the index");
        }

        prop_assert_eq!(index.snapshot(), GroupedIndex::rebuild(grouping, &state).snapshot());
    }

    #[test]
    fn inserts_and_removals_match_a_rebuild(
        grouping in arb_grouping(),
        issues in arb_issues(6),
        keep_mask in prop::collection::vec(any::<bool>(), 6),
    ) {
        let mut index = GroupedIndex::new(grouping.clone());
        for issue in &issues {
            index.insert(issue).expect("paths fit the index");
        }
        prop_assert_eq!(index.snapshot(), GroupedIndex::rebuild(grouping.clone(), &issues).snapshot());

        let mut kept = Vec::new();
        for (issue, keep) in issues.iter().zip(keep_mask) {
            if keep {
                kept.push(issue.clone());
            } else {
                index.remove(issue).expect("paths fit the index");
            }
        }
        prop_assert_eq!(index.snapshot(), GroupedIndex::rebuild(grouping, &kept).snapshot());
    }
}

#[test]
fn grouping_depth_selects_the_planner() {
    use lanes_core::IssueField;

    assert_eq!(Grouping::ungrouped().depth(), 0);
    assert_eq!(Grouping::by(IssueField::State).depth(), 1);
    assert_eq!(
        Grouping::by_and_then(IssueField::State, IssueField::Labels).depth(),
        2
    );
}
