//! Task domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskdeck_db::TaskRow;

use crate::error::{CoreError, CoreResult};

/// Maximum length of a task title or description.
pub const MAX_TEXT_LEN: usize = 255;

/// A task on a board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub board_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Task {
    /// Create a Task from a database row. Unrecognized values fall back to
    /// the defaults.
    pub fn from_row(row: TaskRow) -> Self {
        Self {
            id: row.id,
            board_id: row.board_id,
            title: row.title,
            description: row.description,
            status: TaskStatus::parse(&row.status).unwrap_or_default(),
            priority: TaskPriority::parse(&row.priority).unwrap_or_default(),
            start_date: row.start_date,
            end_date: row.end_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }

    pub fn to_row(&self) -> TaskRow {
        TaskRow {
            id: self.id.clone(),
            board_id: self.board_id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            status: self.status.as_str().to_string(),
            priority: self.priority.as_str().to_string(),
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
            created_at: self.created_at.clone(),
            updated_at: self.updated_at.clone(),
        }
    }
}

/// Task status (board column).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "todo" => Some(Self::Todo),
            "in_progress" => Some(Self::InProgress),
            "done" => Some(Self::Done),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Done => "done",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Input for creating a task.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskInput {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl TaskInput {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> CoreResult<()> {
        validate_title(&self.title)?;
        validate_description(self.description.as_deref())?;
        validate_dates(self.start_date, self.end_date)
    }
}

/// Partial update for a task. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl TaskPatch {
    /// Apply the patch to `task`, validating the merged result.
    pub fn apply(&self, task: &mut Task) -> CoreResult<()> {
        let start = match self.start_date {
            Some(d) => Some(d),
            None => parse_stored_date(task.start_date.as_deref()),
        };
        let end = match self.end_date {
            Some(d) => Some(d),
            None => parse_stored_date(task.end_date.as_deref()),
        };
        validate_dates(start, end)?;

        if let Some(title) = &self.title {
            validate_title(title)?;
            task.title = title.trim().to_string();
        }
        if let Some(description) = &self.description {
            validate_description(Some(description))?;
            task.description = Some(description.clone());
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(d) = self.start_date {
            task.start_date = Some(d.to_rfc3339());
        }
        if let Some(d) = self.end_date {
            task.end_date = Some(d.to_rfc3339());
        }
        Ok(())
    }
}

fn validate_title(title: &str) -> CoreResult<()> {
    let title = title.trim();
    if title.is_empty() || title.len() > MAX_TEXT_LEN {
        return Err(CoreError::validation(format!(
            "title must be 1-{} characters",
            MAX_TEXT_LEN
        )));
    }
    Ok(())
}

fn validate_description(description: Option<&str>) -> CoreResult<()> {
    if description.is_some_and(|d| d.len() > MAX_TEXT_LEN) {
        return Err(CoreError::validation(format!(
            "description exceeds {} characters",
            MAX_TEXT_LEN
        )));
    }
    Ok(())
}

fn validate_dates(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> CoreResult<()> {
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(CoreError::validation("end_date must not precede start_date"));
        }
    }
    Ok(())
}

fn parse_stored_date(value: Option<&str>) -> Option<DateTime<Utc>> {
    value
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|d| d.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn task() -> Task {
        Task {
            id: "t1".to_string(),
            board_id: "b1".to_string(),
            title: "Write docs".to_string(),
            description: None,
            status: TaskStatus::Todo,
            priority: TaskPriority::Medium,
            start_date: Some("2024-03-01T00:00:00+00:00".to_string()),
            end_date: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_validate_input() {
        assert!(TaskInput::new("Write docs").validate().is_ok());
        assert!(TaskInput::new(" ").validate().is_err());
        assert!(TaskInput::new("x".repeat(256)).validate().is_err());

        let backwards = TaskInput {
            start_date: Some(Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap()),
            end_date: Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()),
            ..TaskInput::new("Write docs")
        };
        assert!(backwards.validate().is_err());
    }

    #[test]
    fn test_patch_checks_merged_dates() {
        let mut t = task();
        let patch = TaskPatch {
            end_date: Some(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()),
            ..Default::default()
        };
        assert!(patch.apply(&mut t).is_err());
        assert_eq!(t, task());

        let patch = TaskPatch {
            status: Some(TaskStatus::Done),
            title: Some("Ship docs".to_string()),
            ..Default::default()
        };
        patch.apply(&mut t).unwrap();
        assert_eq!(t.status, TaskStatus::Done);
        assert_eq!(t.title, "Ship docs");
    }

    #[test]
    fn test_wire_values() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
        assert_eq!(TaskPriority::parse("high"), Some(TaskPriority::High));
        assert_eq!(TaskStatus::parse("backlog"), None);
    }
}
