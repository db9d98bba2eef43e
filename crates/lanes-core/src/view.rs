//! Explicit view context and per-view settings.
//!
//! Which filters and grouping apply depends on the view an issue list is
//! shown in. Callers pass a [`ViewContext`] instead of relying on any
//! ambient router or store state.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::date::{DateContext, DateFilterError};
use crate::filter::{CompiledFilter, DisplayFilters, FilterSpec};
use crate::reconcile::Grouping;

/// Kind of issue list being displayed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum ViewKind {
    ProjectIssues,
    Cycle(String),
    Module(String),
    ProjectView(String),
    Archived,
    Draft,
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProjectIssues => f.write_str("project_issues"),
            Self::Cycle(id) => write!(f, "cycle:{id}"),
            Self::Module(id) => write!(f, "module:{id}"),
            Self::ProjectView(id) => write!(f, "project_view:{id}"),
            Self::Archived => f.write_str("archived"),
            Self::Draft => f.write_str("draft"),
        }
    }
}

/// Identifies one issue list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ViewContext {
    pub workspace_slug: String,
    pub project_id: Option<String>,
    pub kind: ViewKind,
}

impl ViewContext {
    #[must_use]
    pub fn project(workspace_slug: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            workspace_slug: workspace_slug.into(),
            project_id: Some(project_id.into()),
            kind: ViewKind::ProjectIssues,
        }
    }

    #[must_use]
    pub fn with_kind(mut self, kind: ViewKind) -> Self {
        self.kind = kind;
        self
    }
}

impl fmt::Display for ViewContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.project_id {
            Some(project) => write!(f, "{}/{project}/{}", self.workspace_slug, self.kind),
            None => write!(f, "{}/{}", self.workspace_slug, self.kind),
        }
    }
}

/// Filters, display options and grouping of one view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewSettings {
    #[serde(default)]
    pub filters: Option<FilterSpec>,
    #[serde(default)]
    pub display_filters: DisplayFilters,
    #[serde(default)]
    pub grouping: Grouping,
}

impl ViewSettings {
    /// Compile this view's filters.
    ///
    /// # Errors
    ///
    /// Returns [`DateFilterError`] when a date expression is malformed.
    pub fn compile_filter(&self, ctx: &DateContext) -> Result<CompiledFilter, DateFilterError> {
        match &self.filters {
            Some(spec) => CompiledFilter::compile(spec, &self.display_filters, ctx),
            None => Ok(CompiledFilter::allow_all()),
        }
    }
}

/// Settings per view, with a fallback for views never configured.
#[derive(Debug, Clone, Default)]
pub struct ViewRegistry {
    defaults: ViewSettings,
    views: HashMap<ViewContext, ViewSettings>,
}

impl ViewRegistry {
    #[must_use]
    pub fn new(defaults: ViewSettings) -> Self {
        Self {
            defaults,
            views: HashMap::new(),
        }
    }

    /// Store settings for a view, returning the ones they replace.
    pub fn set(&mut self, ctx: ViewContext, settings: ViewSettings) -> Option<ViewSettings> {
        self.views.insert(ctx, settings)
    }

    pub fn remove(&mut self, ctx: &ViewContext) -> Option<ViewSettings> {
        self.views.remove(ctx)
    }

    /// Settings for a view, or the registry defaults.
    #[must_use]
    pub fn settings_for(&self, ctx: &ViewContext) -> &ViewSettings {
        self.views.get(ctx).unwrap_or(&self.defaults)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.views.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}
