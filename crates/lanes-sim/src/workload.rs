//! Random issues and field edits over a small fixed vocabulary.
//!
//! Vocabulary values never contain the bucket key separator and never equal
//! `"null"`, so composed keys stay unambiguous.

use chrono::{Days, NaiveDate};
use lanes_core::IssueSnapshot;
use serde::{Deserialize, Serialize};

use crate::rng::DeterministicRng;

pub const STATES: [&str; 5] = ["backlog", "todo", "doing", "review", "done"];
pub const PRIORITIES: [&str; 4] = ["urgent", "high", "medium", "low"];
pub const USERS: [&str; 4] = ["ada", "bo", "cy", "di"];
pub const LABELS: [&str; 5] = ["bug", "ui", "api", "docs", "perf"];
pub const CYCLES: [&str; 3] = ["c1", "c2", "c3"];
pub const MODULES: [&str; 3] = ["auth", "billing", "search"];

/// Share of edits that change two fields at once.
const BULK_EDIT_PERCENT: u8 = 50;

/// Window of generated dates, starting at [`date_origin`].
const DATE_SPAN_DAYS: u64 = 90;

/// First day of the generated date window.
#[must_use]
pub fn date_origin() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default()
}

/// Mix of mutation kinds, in percent. The remainder are field edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationMix {
    pub create_percent: u8,
    pub delete_percent: u8,
    /// Re-save an issue without changing it.
    pub touch_percent: u8,
}

impl Default for MutationMix {
    fn default() -> Self {
        Self {
            create_percent: 10,
            delete_percent: 5,
            touch_percent: 10,
        }
    }
}

impl MutationMix {
    #[must_use]
    pub const fn total(&self) -> u16 {
        self.create_percent as u16 + self.delete_percent as u16 + self.touch_percent as u16
    }
}

/// Attribute changed by a [`Mutation::Edit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditedField {
    State,
    Priority,
    Assignees,
    Labels,
    Cycle,
    Module,
    Parent,
    StartDate,
    TargetDate,
}

impl EditedField {
    const ALL: [Self; 9] = [
        Self::State,
        Self::Priority,
        Self::Assignees,
        Self::Labels,
        Self::Cycle,
        Self::Module,
        Self::Parent,
        Self::StartDate,
        Self::TargetDate,
    ];
}

/// One change to the issue collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Mutation {
    Create { issue: IssueSnapshot },
    Delete { id: String },
    /// One or two fields changed in a single save.
    Edit {
        fields: Vec<EditedField>,
        issue: IssueSnapshot,
    },
    Touch { id: String },
}

impl Mutation {
    #[must_use]
    pub fn issue_id(&self) -> &str {
        match self {
            Self::Create { issue } | Self::Edit { issue, .. } => &issue.id,
            Self::Delete { id } | Self::Touch { id } => id,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Delete { .. } => "delete",
            Self::Edit { .. } => "edit",
            Self::Touch { .. } => "touch",
        }
    }
}

/// Generates issues and mutations from a seeded stream.
#[derive(Debug, Clone)]
pub struct Workload {
    rng: DeterministicRng,
    mix: MutationMix,
    next_id: usize,
}

impl Workload {
    #[must_use]
    pub const fn new(rng: DeterministicRng, mix: MutationMix) -> Self {
        Self {
            rng,
            mix,
            next_id: 0,
        }
    }

    /// A fresh issue with a new id. `existing` supplies parent candidates.
    pub fn new_issue(&mut self, existing: &[IssueSnapshot]) -> IssueSnapshot {
        let id = format!("LN-{}", self.next_id);
        self.next_id += 1;

        let mut issue = IssueSnapshot {
            state_id: self.pick_value(&STATES),
            priority: self.maybe_value(&PRIORITIES, 80),
            assignee_ids: self.values(&USERS, 30),
            label_ids: self.values(&LABELS, 25),
            cycle_id: self.maybe_value(&CYCLES, 50),
            module_ids: self.values(&MODULES, 20),
            start_date: self.maybe_date(40),
            target_date: self.maybe_date(60),
            ..IssueSnapshot::new(id)
        };
        issue.parent_id = self.maybe_parent(&issue.id, existing);
        issue
    }

    /// Next mutation against the current collection.
    ///
    /// An empty collection always yields a create.
    pub fn next_mutation(&mut self, board: &[IssueSnapshot]) -> Mutation {
        let Some(target) = self.rng.pick(board).cloned() else {
            return Mutation::Create {
                issue: self.new_issue(board),
            };
        };

        let roll = self.rng.below(100);
        let create = usize::from(self.mix.create_percent);
        let delete = create + usize::from(self.mix.delete_percent);
        let touch = delete + usize::from(self.mix.touch_percent);

        if roll < create {
            Mutation::Create {
                issue: self.new_issue(board),
            }
        } else if roll < delete {
            Mutation::Delete { id: target.id }
        } else if roll < touch {
            Mutation::Touch { id: target.id }
        } else {
            let mut fields = vec![self.pick_field()];
            if self.rng.percent(BULK_EDIT_PERCENT) {
                let second = self.pick_field();
                if !fields.contains(&second) {
                    fields.push(second);
                }
            }
            let issue = fields
                .iter()
                .fold(target, |issue, &field| self.edit(issue, field, board));
            Mutation::Edit { fields, issue }
        }
    }

    fn pick_field(&mut self) -> EditedField {
        self.rng
            .pick(&EditedField::ALL)
            .copied()
            .unwrap_or(EditedField::State)
    }

    fn edit(
        &mut self,
        mut issue: IssueSnapshot,
        field: EditedField,
        board: &[IssueSnapshot],
    ) -> IssueSnapshot {
        match field {
            EditedField::State => issue.state_id = self.pick_value(&STATES),
            EditedField::Priority => issue.priority = self.maybe_value(&PRIORITIES, 80),
            EditedField::Assignees => issue.assignee_ids = self.values(&USERS, 30),
            EditedField::Labels => issue.label_ids = self.values(&LABELS, 25),
            EditedField::Cycle => issue.cycle_id = self.maybe_value(&CYCLES, 50),
            EditedField::Module => issue.module_ids = self.values(&MODULES, 20),
            EditedField::Parent => issue.parent_id = self.maybe_parent(&issue.id, board),
            EditedField::StartDate => issue.start_date = self.maybe_date(40),
            EditedField::TargetDate => issue.target_date = self.maybe_date(60),
        }
        issue
    }

    fn pick_value(&mut self, vocabulary: &[&str]) -> Option<String> {
        self.rng.pick(vocabulary).map(ToString::to_string)
    }

    fn maybe_value(&mut self, vocabulary: &[&str], percent: u8) -> Option<String> {
        if self.rng.percent(percent) {
            self.pick_value(vocabulary)
        } else {
            None
        }
    }

    fn values(&mut self, vocabulary: &[&str], percent: u8) -> Vec<String> {
        self.rng
            .subset(vocabulary, percent)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    fn maybe_date(&mut self, percent: u8) -> Option<NaiveDate> {
        if !self.rng.percent(percent) {
            return None;
        }
        let offset = self.rng.next_u64() % DATE_SPAN_DAYS;
        date_origin().checked_add_days(Days::new(offset))
    }

    fn maybe_parent(&mut self, id: &str, board: &[IssueSnapshot]) -> Option<String> {
        if !self.rng.percent(30) {
            return None;
        }
        self.rng
            .pick(board)
            .map(|parent| parent.id.clone())
            .filter(|parent| parent != id)
    }
}
