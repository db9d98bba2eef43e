#![no_main]

use std::collections::HashSet;

use lanes_core::{Grouping, IssueField, IssueSnapshot};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok((previous, current)) = serde_json::from_slice::<(IssueSnapshot, IssueSnapshot)>(data)
    else {
        return;
    };

    for (group, sub) in [
        (IssueField::State, IssueField::Assignees),
        (IssueField::Labels, IssueField::Module),
    ] {
        let grouping = Grouping::by_and_then(group, sub);

        let actions = grouping.reconcile(&previous, &current);
        let mut keys = HashSet::new();
        for action in &actions {
            assert!(keys.insert(action.path.key()), "duplicate key in {actions:?}");
        }

        assert!(grouping.reconcile(&current, &current).is_empty());
    }
});
