//! lanes-core library.
//!
//! Keeps grouped issue views up to date without rebuilding them: given an
//! issue's previous and current field values, the planners compute the
//! bucket insertions and removals to apply. The filter evaluator decides
//! which issues a view shows at all.
//!
//! # Conventions
//!
//! - **Errors**: typed `thiserror` enums for domain failures, `anyhow::Result`
//!   at configuration boundaries.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod config;
pub mod date;
pub mod diff;
pub mod error;
pub mod filter;
pub mod index;
pub mod key;
pub mod model;
pub mod plan;
pub mod reconcile;
pub mod view;

pub use date::{Comparison, DateContext, DateCriterion, DateFilterError, parse_date_filter};
pub use diff::{ActionKind, Difference, difference};
pub use error::ErrorCode;
pub use filter::{CompiledFilter, DisplayFilters, FilterSpec, filter_issues, is_included};
pub use index::{GroupedIndex, IndexError, IndexSnapshot};
pub use key::{ALL_ISSUES, BucketKey, SEPARATOR};
pub use model::{DateField, FieldValue, FilterKey, IssueField, IssueSnapshot};
pub use plan::{
    BucketPath, DimensionValues, PlannedAction, plan_single_dimension, plan_two_dimensions,
};
pub use reconcile::{DEFAULT_NONE_BUCKET, Grouping};
pub use view::{ViewContext, ViewKind, ViewRegistry, ViewSettings};
