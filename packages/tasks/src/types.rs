// ABOUTME: Task type definitions
// ABOUTME: Tasks, the inbox/scheduled start-date state, archive filters, and checklist items

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TaskError;

/// Stored discriminator for the start-date state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum StartDateKind {
    Inbox,
    Scheduled,
}

/// Where a task sits on the calendar: unscheduled in the inbox, or on a concrete date.
///
/// Serialized flat into the task as `startDateKind` plus `startDate` (absent for inbox).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "startDateKind", content = "startDate", rename_all = "lowercase")]
pub enum StartDate {
    #[default]
    Inbox,
    Scheduled(NaiveDate),
}

impl StartDate {
    /// Presence of a date decides the state
    pub fn from_date(date: Option<NaiveDate>) -> Self {
        match date {
            Some(date) => StartDate::Scheduled(date),
            None => StartDate::Inbox,
        }
    }

    /// Build from a kind/date pair, rejecting combinations that disagree
    pub fn from_parts(kind: StartDateKind, date: Option<NaiveDate>) -> Result<Self, TaskError> {
        match (kind, date) {
            (StartDateKind::Inbox, None) => Ok(StartDate::Inbox),
            (StartDateKind::Scheduled, Some(date)) => Ok(StartDate::Scheduled(date)),
            (StartDateKind::Scheduled, None) => Err(TaskError::InconsistentStartDate(
                "scheduled task requires a start date",
            )),
            (StartDateKind::Inbox, Some(_)) => Err(TaskError::InconsistentStartDate(
                "inbox task cannot carry a start date",
            )),
        }
    }

    pub fn kind(&self) -> StartDateKind {
        match self {
            StartDate::Inbox => StartDateKind::Inbox,
            StartDate::Scheduled(_) => StartDateKind::Scheduled,
        }
    }

    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            StartDate::Inbox => None,
            StartDate::Scheduled(date) => Some(*date),
        }
    }
}

/// Requested change to a task's start date on update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartDateChange {
    /// Field omitted: keep whatever the task has
    #[default]
    Unchanged,
    /// Move the task back to the inbox
    Clear,
    /// Schedule on this date
    Set(NaiveDate),
}

impl StartDateChange {
    pub fn apply(self, current: StartDate) -> StartDate {
        match self {
            StartDateChange::Unchanged => current,
            StartDateChange::Clear => StartDate::Inbox,
            StartDateChange::Set(date) => StartDate::Scheduled(date),
        }
    }
}

/// Which tasks a listing returns with respect to archiving
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveFilter {
    #[default]
    ActiveOnly,
    IncludeArchived,
    ArchivedOnly,
}

impl ArchiveFilter {
    /// Collapse the two request flags. `archived_only` wins when both are set.
    pub fn from_flags(include_archived: bool, archived_only: bool) -> Self {
        if archived_only {
            ArchiveFilter::ArchivedOnly
        } else if include_archived {
            ArchiveFilter::IncludeArchived
        } else {
            ArchiveFilter::ActiveOnly
        }
    }

    pub(crate) fn sql_condition(&self) -> Option<&'static str> {
        match self {
            ArchiveFilter::ActiveOnly => Some("t.archived_at IS NULL"),
            ArchiveFilter::IncludeArchived => None,
            ArchiveFilter::ArchivedOnly => Some("t.archived_at IS NOT NULL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
    pub id: Uuid,
    pub task_id: Uuid,
    pub content: String,
    pub completed: bool,
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub owner_id: String,
    pub title: String,
    pub notes: String,
    #[serde(flatten)]
    pub start_date: StartDate,
    pub archived_at: Option<DateTime<Utc>>,
    pub tag_ids: Vec<Uuid>,
    pub checklist_items: Vec<ChecklistItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }
}

/// Input for creating a task
#[derive(Debug, Clone, Default)]
pub struct TaskCreateInput {
    pub title: String,
    pub notes: String,
    pub tag_names: Vec<String>,
    pub start_date: Option<NaiveDate>,
    pub checklist_items: Vec<String>,
}

/// Input for updating a task. Tag names replace the full set.
#[derive(Debug, Clone, Default)]
pub struct TaskUpdateInput {
    pub title: String,
    pub notes: String,
    pub tag_names: Vec<String>,
    pub start_date: StartDateChange,
}

/// Listing parameters; tag ids match with OR semantics
#[derive(Debug, Clone, Default)]
pub struct TaskListQuery {
    pub tag_ids: Vec<Uuid>,
    pub archive_filter: ArchiveFilter,
    pub limit: u32,
    pub offset: u32,
}
