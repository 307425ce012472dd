//! Task record and the status derived from its timestamp columns.

use chrono::{DateTime, Utc};
use std::fmt;

/// A task as submitted by a caller, before it has been assigned an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTask {
    pub description: String,
    pub scheduled_at: Option<DateTime<Utc>>,
}

impl RawTask {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            scheduled_at: None,
        }
    }

    pub fn scheduled_at(mut self, at: DateTime<Utc>) -> Self {
        self.scheduled_at = Some(at);
        self
    }
}

/// A persisted task row.
///
/// `TaskStatus` is never stored as its own column; it is always derived from
/// the four nullable timestamps below so that a single write can never leave
/// the row's state and its status out of sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRecord {
    pub id: i64,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub scheduled_at: DateTime<Utc>,
    pub performed_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl TaskRecord {
    pub fn status(&self) -> TaskStatus {
        match (self.performed_at, self.cancelled_at, self.finished_at) {
            (_, _, Some(_)) => TaskStatus::Finished,
            (_, Some(_), None) => TaskStatus::Cancelling,
            (Some(_), None, None) => TaskStatus::Running,
            (None, None, None) => TaskStatus::Pending,
        }
    }

    /// Whether this row is unclaimed, uncancelled, and due.
    pub fn is_eligible(&self, now: DateTime<Utc>) -> bool {
        self.performed_at.is_none()
            && self.cancelled_at.is_none()
            && self.finished_at.is_none()
            && self.scheduled_at <= now
    }
}

impl fmt::Display for TaskRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Task(id={}, status={})", self.id, self.status())
    }
}

impl sqlx::FromRow<'_, sqlx::postgres::PgRow> for TaskRecord {
    fn from_row(row: &sqlx::postgres::PgRow) -> sqlx::Result<Self> {
        use sqlx::Row;
        Ok(Self {
            id: row.try_get("id")?,
            description: row.try_get("description")?,
            created_at: row.try_get("created_at")?,
            scheduled_at: row.try_get("scheduled_at")?,
            performed_at: row.try_get("performed_at")?,
            finished_at: row.try_get("finished_at")?,
            cancelled_at: row.try_get("cancelled_at")?,
            error: row.try_get("error")?,
        })
    }
}

/// Read-only view over a [`TaskRecord`]'s timestamps, derived rather than stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Running,
    Cancelling,
    Finished,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Cancelling => "cancelling",
            TaskStatus::Finished => "finished",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn base(now: DateTime<Utc>) -> TaskRecord {
        TaskRecord {
            id: 1,
            description: "P1".into(),
            created_at: now,
            scheduled_at: now,
            performed_at: None,
            finished_at: None,
            cancelled_at: None,
            error: None,
        }
    }

    #[test]
    fn status_pending_when_no_timestamps_set() {
        let now = Utc::now();
        assert_eq!(base(now).status(), TaskStatus::Pending);
    }

    #[test]
    fn status_running_when_performed_at_set() {
        let now = Utc::now();
        let mut t = base(now);
        t.performed_at = Some(now);
        assert_eq!(t.status(), TaskStatus::Running);
    }

    #[test]
    fn status_cancelling_when_cancelled_before_finish() {
        let now = Utc::now();
        let mut t = base(now);
        t.performed_at = Some(now);
        t.cancelled_at = Some(now);
        assert_eq!(t.status(), TaskStatus::Cancelling);
    }

    #[test]
    fn status_finished_takes_priority() {
        let now = Utc::now();
        let mut t = base(now);
        t.performed_at = Some(now);
        t.cancelled_at = Some(now);
        t.finished_at = Some(now);
        assert_eq!(t.status(), TaskStatus::Finished);
    }

    #[test]
    fn eligible_requires_all_null_and_scheduled_in_past() {
        let now = Utc::now();
        let t = base(now);
        assert!(t.is_eligible(now));
        assert!(!t.is_eligible(now - Duration::seconds(1)));

        let mut cancelled = base(now);
        cancelled.cancelled_at = Some(now);
        assert!(!cancelled.is_eligible(now));
    }
}
