//! Canonical bucket keys for (group, sub-group) combinations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Joins a group value and a sub-group value into one key.
pub const SEPARATOR: &str = "_";

/// Key of the single bucket used when no grouping dimension is configured.
pub const ALL_ISSUES: &str = "All Issues";

/// Sub-group value that callers use to mean "no sub-group".
const NULL_SUB_GROUP: &str = "null";

/// A composed bucket key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BucketKey(String);

impl BucketKey {
    /// Compose the key for a (group, sub-group) pair.
    ///
    /// - group and a real sub-group: `group_subgroup`
    /// - group only (or a sub-group of `"null"`): `group`
    /// - neither: [`ALL_ISSUES`]
    #[must_use]
    pub fn compose(group: Option<&str>, sub_group: Option<&str>) -> Self {
        match (group, sub_group) {
            (Some(group), Some(sub_group)) if sub_group != NULL_SUB_GROUP => {
                Self(format!("{group}{SEPARATOR}{sub_group}"))
            }
            (Some(group), _) => Self(group.to_string()),
            (None, _) => Self::all_issues(),
        }
    }

    /// The ALL-ISSUES sentinel key.
    #[must_use]
    pub fn all_issues() -> Self {
        Self(ALL_ISSUES.to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for BucketKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
