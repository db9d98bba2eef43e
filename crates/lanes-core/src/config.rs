use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ErrorCode;
use crate::filter::{DisplayFilters, FilterSpec};
use crate::model::IssueField;
use crate::reconcile::{DEFAULT_NONE_BUCKET, Grouping};
use crate::view::ViewSettings;

/// Project-level configuration read from `.lanes/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub grouping: GroupingConfig,
    #[serde(default)]
    pub display: DisplayFilters,
    #[serde(default)]
    pub filters: FilterSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupingConfig {
    #[serde(default)]
    pub group_by: Option<String>,
    #[serde(default)]
    pub sub_group_by: Option<String>,
    #[serde(default = "default_none_bucket")]
    pub none_bucket: Option<String>,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            group_by: None,
            sub_group_by: None,
            none_bucket: default_none_bucket(),
        }
    }
}

fn default_none_bucket() -> Option<String> {
    Some(DEFAULT_NONE_BUCKET.to_string())
}

impl ProjectConfig {
    /// Resolve the configured field names into a [`Grouping`].
    ///
    /// # Errors
    ///
    /// Fails with an [`ErrorCode::UnknownGroupField`] message when a field
    /// name is unknown, or [`ErrorCode::DuplicateGroupField`] when group and
    /// sub-group name the same field.
    pub fn grouping(&self) -> Result<Grouping> {
        let group_by = resolve_field(self.grouping.group_by.as_deref())?;
        let sub_group_by = resolve_field(self.grouping.sub_group_by.as_deref())?;

        if group_by.is_some() && group_by == sub_group_by {
            let code = ErrorCode::DuplicateGroupField;
            bail!(
                "{code}: {} ('{}')",
                code.message(),
                group_by.map_or("", IssueField::as_str)
            );
        }
        if group_by.is_none() && sub_group_by.is_some() {
            tracing::warn!("sub_group_by is ignored without group_by");
        }

        Ok(Grouping {
            group_by,
            sub_group_by,
            none_bucket: self
                .grouping
                .none_bucket
                .clone()
                .filter(|bucket| !bucket.trim().is_empty()),
        })
    }

    /// Default view settings derived from this configuration.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`Self::grouping`].
    pub fn view_settings(&self) -> Result<ViewSettings> {
        Ok(ViewSettings {
            filters: Some(self.filters.clone()),
            display_filters: self.display,
            grouping: self.grouping()?,
        })
    }
}

fn resolve_field(name: Option<&str>) -> Result<Option<IssueField>> {
    let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) else {
        return Ok(None);
    };
    match name.parse::<IssueField>() {
        Ok(field) => Ok(Some(field)),
        Err(err) => {
            let code = ErrorCode::UnknownGroupField;
            bail!("{code}: {} ({err})", code.message())
        }
    }
}

/// Load `.lanes/config.toml` under `project_root`, or defaults if absent.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(".lanes/config.toml");
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content).with_context(|| {
        format!(
            "{}: Failed to parse {}",
            ErrorCode::ConfigParseError,
            path.display()
        )
    })
}
