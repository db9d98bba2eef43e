use std::fmt;

use crate::date::DateFilterError;
use crate::index::IndexError;

/// Machine-readable error codes for callers that surface failures to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    UnknownGroupField,
    DuplicateGroupField,
    InvalidDateFilter,
    BucketPathMismatch,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::UnknownGroupField => "E1002",
            Self::DuplicateGroupField => "E1003",
            Self::InvalidDateFilter => "E2001",
            Self::BucketPathMismatch => "E3001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::UnknownGroupField => "Unknown grouping field",
            Self::DuplicateGroupField => "Group and sub-group use the same field",
            Self::InvalidDateFilter => "Invalid date filter",
            Self::BucketPathMismatch => "Bucket path does not match index shape",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in .lanes/config.toml and retry."),
            Self::UnknownGroupField => Some(
                "Use one of: project, state, state_group, priority, assignees, labels, cycle, module, created_by, mentions, parent.",
            ),
            Self::DuplicateGroupField => Some("Pick a different field for sub_group_by."),
            Self::InvalidDateFilter => Some(
                "Use `YYYY-MM-DD;after|before|on`, `YYYY-MM-DD;between;YYYY-MM-DD` or `N_days|weeks|months;after|before;fromnow|ago`.",
            ),
            Self::BucketPathMismatch => {
                Some("Rebuild the index after changing the grouping configuration.")
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl From<&DateFilterError> for ErrorCode {
    fn from(_: &DateFilterError) -> Self {
        Self::InvalidDateFilter
    }
}

impl From<&IndexError> for ErrorCode {
    fn from(_: &IndexError) -> Self {
        Self::BucketPathMismatch
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorCode;
    use std::collections::HashSet;

    const ALL: [ErrorCode; 5] = [
        ErrorCode::ConfigParseError,
        ErrorCode::UnknownGroupField,
        ErrorCode::DuplicateGroupField,
        ErrorCode::InvalidDateFilter,
        ErrorCode::BucketPathMismatch,
    ];

    #[test]
    fn all_codes_are_unique() {
        let mut seen = HashSet::new();
        for code in ALL {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        for code in ALL {
            let text = code.code();
            assert_eq!(text.len(), 5);
            assert!(text.starts_with('E'));
            assert!(text.chars().skip(1).all(|c| c.is_ascii_digit()));
            assert_eq!(code.to_string(), text);
        }
    }

    #[test]
    fn date_errors_map_to_invalid_date_filter() {
        use crate::date::{DateContext, parse_date_filter};

        let today = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date");
        let err = parse_date_filter("tomorrow", &DateContext::fixed(today)).unwrap_err();
        assert_eq!(ErrorCode::from(&err), ErrorCode::InvalidDateFilter);
    }

    #[test]
    fn index_errors_map_to_bucket_path_mismatch() {
        use crate::diff::ActionKind;
        use crate::index::GroupedIndex;
        use crate::model::IssueField;
        use crate::plan::{BucketPath, PlannedAction};
        use crate::reconcile::Grouping;

        let mut index = GroupedIndex::new(Grouping::by(IssueField::State));
        let err = index
            .apply(
                "a",
                &[PlannedAction::new(BucketPath::nested("todo", "u1"), ActionKind::Add)],
            )
            .unwrap_err();
        let code = ErrorCode::from(&err);
        assert_eq!(code, ErrorCode::BucketPathMismatch);
        assert_eq!(code.code(), "E3001");
        assert!(code.hint().is_some());
    }
}
