//! Compound filter evaluation for issue views.
//!
//! A [`FilterSpec`] maps filter keys to allowed values. Keys combine with
//! AND. Within a categorical key the values combine with OR; within a date
//! key every expression must hold. Empty value lists and unknown keys do
//! not constrain.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::date::{DateContext, DateCriterion, DateFilterError, parse_date_filter};
use crate::model::{DateField, FilterKey, IssueField, IssueSnapshot};

/// Raw filter specification: filter key → allowed values or date expressions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSpec(BTreeMap<String, Vec<String>>);

impl FilterSpec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert of one key.
    #[must_use]
    pub fn with<I, S>(mut self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(key, values);
        self
    }

    pub fn insert<I, S>(&mut self, key: impl Into<String>, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.0
            .insert(key.into(), values.into_iter().map(Into::into).collect());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.0.get(key).map(Vec::as_slice)
    }

    /// Keys whose value list is non-empty.
    pub fn active(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0
            .iter()
            .filter(|(_, values)| !values.is_empty())
            .map(|(key, values)| (key.as_str(), values.as_slice()))
    }

    #[must_use]
    pub fn has_active(&self) -> bool {
        self.active().next().is_some()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, Vec<V>)> for FilterSpec {
    fn from_iter<T: IntoIterator<Item = (K, Vec<V>)>>(iter: T) -> Self {
        let mut spec = Self::new();
        for (key, values) in iter {
            spec.insert(key, values);
        }
        spec
    }
}

/// Display options that affect which issues a view shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayFilters {
    /// Show issues that have a parent.
    #[serde(default = "default_true")]
    pub sub_issue: bool,
}

impl Default for DisplayFilters {
    fn default() -> Self {
        Self { sub_issue: true }
    }
}

const fn default_true() -> bool {
    true
}

/// One active constraint after key resolution.
#[derive(Debug, Clone, PartialEq)]
enum Constraint {
    Field {
        field: IssueField,
        allowed: Vec<String>,
    },
    Date {
        field: DateField,
        criteria: Vec<DateCriterion>,
    },
}

impl Constraint {
    fn admits(&self, issue: &IssueSnapshot) -> bool {
        match self {
            Self::Field { field, allowed } => field.value(issue).matches_any(allowed),
            Self::Date { field, criteria } => issue
                .date(*field)
                .is_some_and(|date| criteria.iter().all(|c| c.matches(date))),
        }
    }
}

/// A filter specification with keys resolved and date expressions parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFilter {
    constraints: Vec<Constraint>,
    hide_sub_issues: bool,
}

impl CompiledFilter {
    /// Resolve keys and parse every date expression.
    ///
    /// Unknown keys are dropped with a warning.
    ///
    /// # Errors
    ///
    /// Returns the first [`DateFilterError`] among the date expressions.
    pub fn compile(
        spec: &FilterSpec,
        display: &DisplayFilters,
        ctx: &DateContext,
    ) -> Result<Self, DateFilterError> {
        let mut constraints = Vec::new();

        for (key, values) in spec.active() {
            match FilterKey::parse(key) {
                Some(FilterKey::Field(field)) => constraints.push(Constraint::Field {
                    field,
                    allowed: values.to_vec(),
                }),
                Some(FilterKey::Date(field)) => {
                    let criteria = values
                        .iter()
                        .map(|expression| parse_date_filter(expression, ctx))
                        .collect::<Result<Vec<_>, _>>()?;
                    constraints.push(Constraint::Date { field, criteria });
                }
                None => warn!(key, "skipping unknown filter key"),
            }
        }

        let hide_sub_issues = !display.sub_issue;
        debug!(
            constraints = constraints.len(),
            hide_sub_issues, "compiled filter"
        );
        Ok(Self {
            constraints,
            hide_sub_issues,
        })
    }

    /// A filter that admits every issue.
    #[must_use]
    pub const fn allow_all() -> Self {
        Self {
            constraints: Vec::new(),
            hide_sub_issues: false,
        }
    }

    /// Whether the issue belongs in the filtered view.
    #[must_use]
    pub fn matches(&self, issue: &IssueSnapshot) -> bool {
        if self.hide_sub_issues && issue.is_sub_issue() {
            return false;
        }
        self.constraints.iter().all(|c| c.admits(issue))
    }

    /// Number of constraints that survived key resolution.
    #[must_use]
    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }
}

/// Decide whether an issue belongs in a filtered view.
///
/// - no filters: included
/// - sub-issues hidden and the issue has a parent: excluded, before any
///   other check
/// - otherwise every active filter key must admit the issue
///
/// # Errors
///
/// Returns [`DateFilterError`] when a configured date expression is
/// malformed.
pub fn is_included(
    issue: &IssueSnapshot,
    filters: Option<&FilterSpec>,
    display: Option<&DisplayFilters>,
    ctx: &DateContext,
) -> Result<bool, DateFilterError> {
    let Some(filters) = filters else {
        return Ok(true);
    };
    let display = display.copied().unwrap_or_default();

    if !display.sub_issue && issue.is_sub_issue() {
        return Ok(false);
    }
    if !filters.has_active() {
        return Ok(true);
    }

    Ok(CompiledFilter::compile(filters, &display, ctx)?.matches(issue))
}

/// Ids of the issues admitted by `filter`, in input order.
#[must_use]
pub fn filter_issues<'a>(filter: &CompiledFilter, issues: &'a [IssueSnapshot]) -> Vec<&'a str> {
    issues
        .iter()
        .filter(|issue| filter.matches(issue))
        .map(|issue| issue.id.as_str())
        .collect()
}
