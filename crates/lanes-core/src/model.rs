//! Issue snapshots and the closed mapping from field names to attributes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Plain snapshot of the grouping- and filter-relevant fields of an issue.
///
/// The store that owns issues builds these; nothing here mutates one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IssueSnapshot {
    pub id: String,
    pub project_id: Option<String>,
    pub state_id: Option<String>,
    pub state_group: Option<String>,
    pub priority: Option<String>,
    pub assignee_ids: Vec<String>,
    pub label_ids: Vec<String>,
    pub cycle_id: Option<String>,
    pub module_ids: Vec<String>,
    pub created_by: Option<String>,
    pub mention_ids: Vec<String>,
    pub parent_id: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub target_date: Option<NaiveDate>,
}

impl IssueSnapshot {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Whether the issue is a sub-item of another issue.
    #[must_use]
    pub const fn is_sub_issue(&self) -> bool {
        self.parent_id.is_some()
    }

    #[must_use]
    pub const fn date(&self, field: DateField) -> Option<NaiveDate> {
        match field {
            DateField::StartDate => self.start_date,
            DateField::TargetDate => self.target_date,
        }
    }
}

/// Value of one issue attribute: single-valued or a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Single(Option<&'a str>),
    Many(&'a [String]),
}

impl FieldValue<'_> {
    /// Values this attribute contributes to a grouping dimension.
    #[must_use]
    pub fn dimension_values(&self) -> Vec<String> {
        match self {
            Self::Single(value) => value.iter().map(|v| (*v).to_string()).collect(),
            Self::Many(values) => values.to_vec(),
        }
    }

    /// Whether any of `allowed` matches this attribute.
    ///
    /// A list matches when it shares at least one value with `allowed`; a
    /// single value matches when it is contained in `allowed`.
    #[must_use]
    pub fn matches_any<S: AsRef<str>>(&self, allowed: &[S]) -> bool {
        match self {
            Self::Single(None) => false,
            Self::Single(Some(value)) => allowed.iter().any(|a| a.as_ref() == *value),
            Self::Many(values) => allowed
                .iter()
                .any(|a| values.iter().any(|v| v == a.as_ref())),
        }
    }
}

/// Categorical issue attributes usable for grouping and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueField {
    Project,
    State,
    StateGroup,
    Priority,
    Assignees,
    Labels,
    Cycle,
    Module,
    CreatedBy,
    Mentions,
    Parent,
}

impl IssueField {
    pub const ALL: [Self; 11] = [
        Self::Project,
        Self::State,
        Self::StateGroup,
        Self::Priority,
        Self::Assignees,
        Self::Labels,
        Self::Cycle,
        Self::Module,
        Self::CreatedBy,
        Self::Mentions,
        Self::Parent,
    ];

    /// Filter/grouping key naming this attribute.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::State => "state",
            Self::StateGroup => "state_group",
            Self::Priority => "priority",
            Self::Assignees => "assignees",
            Self::Labels => "labels",
            Self::Cycle => "cycle",
            Self::Module => "module",
            Self::CreatedBy => "created_by",
            Self::Mentions => "mentions",
            Self::Parent => "parent",
        }
    }

    /// Whether the attribute holds a list of values.
    #[must_use]
    pub const fn is_multi_valued(self) -> bool {
        matches!(
            self,
            Self::Assignees | Self::Labels | Self::Module | Self::Mentions
        )
    }

    /// Read this attribute from an issue.
    #[must_use]
    pub fn value(self, issue: &IssueSnapshot) -> FieldValue<'_> {
        match self {
            Self::Project => FieldValue::Single(issue.project_id.as_deref()),
            Self::State => FieldValue::Single(issue.state_id.as_deref()),
            Self::StateGroup => FieldValue::Single(issue.state_group.as_deref()),
            Self::Priority => FieldValue::Single(issue.priority.as_deref()),
            Self::Assignees => FieldValue::Many(&issue.assignee_ids),
            Self::Labels => FieldValue::Many(&issue.label_ids),
            Self::Cycle => FieldValue::Single(issue.cycle_id.as_deref()),
            Self::Module => FieldValue::Many(&issue.module_ids),
            Self::CreatedBy => FieldValue::Single(issue.created_by.as_deref()),
            Self::Mentions => FieldValue::Many(&issue.mention_ids),
            Self::Parent => FieldValue::Single(issue.parent_id.as_deref()),
        }
    }
}

impl fmt::Display for IssueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IssueField {
    type Err = ParseFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == normalized)
            .ok_or_else(|| ParseFieldError {
                got: s.to_string(),
            })
    }
}

/// The two reserved date attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateField {
    StartDate,
    TargetDate,
}

impl DateField {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StartDate => "start_date",
            Self::TargetDate => "target_date",
        }
    }
}

impl fmt::Display for DateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a filter key constrains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKey {
    Field(IssueField),
    Date(DateField),
}

impl FilterKey {
    /// Resolve a filter key; unknown keys resolve to `None`.
    #[must_use]
    pub fn parse(key: &str) -> Option<Self> {
        match key.trim().to_ascii_lowercase().as_str() {
            "start_date" => Some(Self::Date(DateField::StartDate)),
            "target_date" => Some(Self::Date(DateField::TargetDate)),
            other => other.parse().ok().map(Self::Field),
        }
    }
}

/// Error returned when a field name is not a known attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFieldError {
    pub got: String,
}

impl fmt::Display for ParseFieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown issue field: '{}'", self.got)
    }
}

impl std::error::Error for ParseFieldError {}
