//! Added/removed values between two membership lists of one dimension.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Direction of a bucket mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActionKind {
    Add,
    Delete,
}

impl ActionKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "ADD",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Values that entered (`add`) and left (`delete`) a dimension.
///
/// Both lists are free of duplicates. Order follows first occurrence in the
/// input but callers should treat the lists as sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Difference {
    pub add: Vec<String>,
    pub delete: Vec<String>,
}

impl Difference {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.delete.is_empty()
    }

    /// The list for one action kind.
    #[must_use]
    pub fn get(&self, kind: ActionKind) -> &[String] {
        match kind {
            ActionKind::Add => &self.add,
            ActionKind::Delete => &self.delete,
        }
    }
}

/// Compute which values were added to and removed from a dimension.
///
/// `add` holds values in `current` but not in `previous`; `delete` holds
/// values in `previous` but not in `current`. With `only` set, the other
/// list is left empty and never computed.
#[must_use]
pub fn difference<S: AsRef<str>>(
    current: &[S],
    previous: &[S],
    only: Option<ActionKind>,
) -> Difference {
    let wants = |kind| only.is_none_or(|only| only == kind);

    let add = if wants(ActionKind::Add) {
        missing_from(current, previous)
    } else {
        Vec::new()
    };
    let delete = if wants(ActionKind::Delete) {
        missing_from(previous, current)
    } else {
        Vec::new()
    };

    Difference { add, delete }
}

/// Distinct values of `source` absent from `other`, in first-seen order.
fn missing_from<S: AsRef<str>>(source: &[S], other: &[S]) -> Vec<String> {
    let other: HashSet<&str> = other.iter().map(AsRef::as_ref).collect();
    let mut seen = HashSet::with_capacity(source.len());

    source
        .iter()
        .map(AsRef::as_ref)
        .filter(|value| !other.contains(value) && seen.insert(*value))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(mut values: Vec<String>) -> Vec<String> {
        values.sort();
        values
    }

    #[test]
    fn added_and_removed_values_are_split() {
        let diff = difference(&["u1", "u3"], &["u1", "u2"], None);
        assert_eq!(diff.add, vec!["u3"]);
        assert_eq!(diff.delete, vec!["u2"]);
    }

    #[test]
    fn identical_lists_produce_nothing() {
        let diff = difference(&["a", "b"], &["b", "a"], None);
        assert!(diff.is_empty());
    }

    #[test]
    fn duplicates_appear_once() {
        let diff = difference(&["x", "x", "y"], &[], None);
        assert_eq!(sorted(diff.add), vec!["x", "y"]);
        assert!(diff.delete.is_empty());
    }

    #[test]
    fn restricting_to_add_leaves_delete_empty() {
        let diff = difference(&["a", "c"], &["b"], Some(ActionKind::Add));
        assert_eq!(sorted(diff.add), vec!["a", "c"]);
        assert!(diff.delete.is_empty());
    }

    #[test]
    fn restricting_to_delete_leaves_add_empty() {
        let diff = difference(&["a"], &["b", "b"], Some(ActionKind::Delete));
        assert!(diff.add.is_empty());
        assert_eq!(diff.delete, vec!["b"]);
        assert_eq!(diff.get(ActionKind::Delete), ["b".to_string()]);
    }

    #[test]
    fn empty_inputs() {
        let empty: [&str; 0] = [];
        assert!(difference(&empty, &empty, None).is_empty());
        assert_eq!(difference(&empty, &["a"], None).delete, vec!["a"]);
    }

    #[test]
    fn action_kind_serializes_uppercase() {
        assert_eq!(ActionKind::Add.to_string(), "ADD");
        assert_eq!(
            serde_json::to_string(&ActionKind::Delete).expect("serialize"),
            "\"DELETE\""
        );
    }
}
