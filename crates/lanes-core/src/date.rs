//! Date-filter expressions: parsing into a [`DateCriterion`] and matching
//! candidate dates against it.
//!
//! Grammar (segments separated by `;`):
//!
//! | expression                           | meaning                          |
//! |--------------------------------------|----------------------------------|
//! | `2024-05-01;after`                   | on or after the date             |
//! | `2024-05-01;before`                  | on or before the date            |
//! | `2024-05-01;on`                      | exactly the date                 |
//! | `2024-05-01;between;2024-05-31`      | inside the closed range          |
//! | `2_weeks;after;fromnow`              | on or after today + 2 weeks      |
//! | `1_months;before;ago`                | on or before today − 1 month     |
//!
//! Relative units are `days`, `weeks` and `months`. "Today" always comes
//! from an explicit [`DateContext`].

use chrono::{Days, Local, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Errors from parsing a date-filter expression.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DateFilterError {
    /// The expression has no `;comparison` segment.
    #[error("date filter '{expression}' has no comparison (expected `<date>;<comparison>`)")]
    MissingComparison { expression: String },

    /// The comparison segment is not one of the known keywords.
    #[error("date filter '{expression}' has unknown comparison '{comparison}'")]
    UnknownComparison {
        expression: String,
        comparison: String,
    },

    /// A date segment is not `YYYY-MM-DD`.
    #[error("date filter '{expression}' has invalid date '{value}'")]
    InvalidDate { expression: String, value: String },

    /// A relative segment is not `<count>_<unit>` with a known unit.
    #[error("date filter '{expression}' has invalid relative offset '{value}'")]
    InvalidOffset { expression: String, value: String },

    /// The direction of a relative offset is not `fromnow` or `ago`.
    #[error("date filter '{expression}' has unknown direction '{direction}'")]
    UnknownDirection {
        expression: String,
        direction: String,
    },

    /// The expression has segments the comparison does not use.
    #[error("date filter '{expression}' has unexpected trailing segments")]
    TrailingSegments { expression: String },

    /// Applying a relative offset left the representable date range.
    #[error("date filter '{expression}' resolves outside the supported date range")]
    OutOfRange { expression: String },
}

/// How a candidate date is compared with the reference date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "type", content = "until")]
pub enum Comparison {
    /// Candidate on or after the reference.
    After,
    /// Candidate on or before the reference.
    Before,
    /// Candidate equal to the reference.
    On,
    /// Candidate between the reference and `until`, both inclusive.
    Between(NaiveDate),
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::After => f.write_str("after"),
            Self::Before => f.write_str("before"),
            Self::On => f.write_str("on"),
            Self::Between(until) => write!(f, "between {until}"),
        }
    }
}

/// A parsed date-filter expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateCriterion {
    pub comparison: Comparison,
    pub reference: NaiveDate,
}

impl DateCriterion {
    /// Whether `candidate` satisfies this criterion.
    #[must_use]
    pub fn matches(&self, candidate: NaiveDate) -> bool {
        matches_date(candidate, self.reference, self.comparison)
    }
}

/// The "today" used to resolve relative expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateContext {
    pub today: NaiveDate,
}

impl DateContext {
    /// Context anchored on the local calendar date.
    #[must_use]
    pub fn today() -> Self {
        Self {
            today: Local::now().date_naive(),
        }
    }

    /// Context anchored on a fixed date.
    #[must_use]
    pub const fn fixed(today: NaiveDate) -> Self {
        Self { today }
    }
}

impl Default for DateContext {
    fn default() -> Self {
        Self::today()
    }
}

/// Compare a candidate date with a reference date.
#[must_use]
pub fn matches_date(candidate: NaiveDate, reference: NaiveDate, comparison: Comparison) -> bool {
    match comparison {
        Comparison::After => candidate >= reference,
        Comparison::Before => candidate <= reference,
        Comparison::On => candidate == reference,
        Comparison::Between(until) => candidate >= reference && candidate <= until,
    }
}

/// Parse a date-filter expression.
///
/// # Errors
///
/// Returns [`DateFilterError`] when the expression does not follow the
/// grammar in the module docs or a relative offset overflows.
pub fn parse_date_filter(
    expression: &str,
    ctx: &DateContext,
) -> Result<DateCriterion, DateFilterError> {
    let mut segments = expression.split(';').map(str::trim);
    let value = segments.next().unwrap_or_default();
    let Some(comparison) = segments.next().filter(|s| !s.is_empty()) else {
        return Err(DateFilterError::MissingComparison {
            expression: expression.to_string(),
        });
    };
    let third = segments.next();
    if segments.next().is_some() {
        return Err(DateFilterError::TrailingSegments {
            expression: expression.to_string(),
        });
    }

    let comparison = match comparison.to_ascii_lowercase().as_str() {
        "after" => Comparison::After,
        "before" => Comparison::Before,
        "on" => Comparison::On,
        "between" => {
            let until = third.ok_or_else(|| DateFilterError::MissingComparison {
                expression: expression.to_string(),
            })?;
            let criterion = DateCriterion {
                comparison: Comparison::Between(parse_absolute(expression, until)?),
                reference: parse_absolute(expression, value)?,
            };
            return Ok(criterion);
        }
        other => {
            return Err(DateFilterError::UnknownComparison {
                expression: expression.to_string(),
                comparison: other.to_string(),
            });
        }
    };

    let reference = match third {
        None => parse_absolute(expression, value)?,
        Some(direction) => resolve_relative(expression, value, direction, ctx.today)?,
    };

    Ok(DateCriterion {
        comparison,
        reference,
    })
}

fn parse_absolute(expression: &str, value: &str) -> Result<NaiveDate, DateFilterError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| DateFilterError::InvalidDate {
        expression: expression.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Clone, Copy)]
enum Unit {
    Days,
    Weeks,
    Months,
}

fn resolve_relative(
    expression: &str,
    value: &str,
    direction: &str,
    today: NaiveDate,
) -> Result<NaiveDate, DateFilterError> {
    let invalid_offset = || DateFilterError::InvalidOffset {
        expression: expression.to_string(),
        value: value.to_string(),
    };

    let (count, unit) = value.split_once('_').ok_or_else(invalid_offset)?;
    let count: u32 = count.parse().map_err(|_| invalid_offset())?;
    let unit = match unit.to_ascii_lowercase().as_str() {
        "day" | "days" => Unit::Days,
        "week" | "weeks" => Unit::Weeks,
        "month" | "months" => Unit::Months,
        _ => return Err(invalid_offset()),
    };

    let forward = match direction.to_ascii_lowercase().as_str() {
        "fromnow" => true,
        "ago" => false,
        other => {
            return Err(DateFilterError::UnknownDirection {
                expression: expression.to_string(),
                direction: other.to_string(),
            });
        }
    };

    let resolved = match (unit, forward) {
        (Unit::Days, true) => today.checked_add_days(Days::new(u64::from(count))),
        (Unit::Days, false) => today.checked_sub_days(Days::new(u64::from(count))),
        (Unit::Weeks, true) => today.checked_add_days(Days::new(u64::from(count) * 7)),
        (Unit::Weeks, false) => today.checked_sub_days(Days::new(u64::from(count) * 7)),
        (Unit::Months, true) => today.checked_add_months(Months::new(count)),
        (Unit::Months, false) => today.checked_sub_months(Months::new(count)),
    };

    resolved.ok_or_else(|| DateFilterError::OutOfRange {
        expression: expression.to_string(),
    })
}
