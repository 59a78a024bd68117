use chrono::{DateTime, Local, NaiveDate, Utc};

pub type TaskId = String;
pub type NoteId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Status {
    #[default]
    NotStarted,
    InProgress,
    Completed,
    Overdue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub status: Status,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// User input for a task that has not been placed on a date yet.
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub priority: Priority,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub id: NoteId,
    pub content: String,
    pub date: NaiveDate,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub id: u64,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Local>,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    pub fn label(&self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Priority::High => Priority::Medium,
            Priority::Medium => Priority::Low,
            Priority::Low => Priority::High,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Priority::High => Priority::Low,
            Priority::Medium => Priority::High,
            Priority::Low => Priority::Medium,
        }
    }
}

impl Status {
    pub fn label(&self) -> &'static str {
        match self {
            Status::NotStarted => "Not Started",
            Status::InProgress => "In Progress",
            Status::Completed => "Completed",
            Status::Overdue => "Overdue",
        }
    }

    /// Cycles through every status in display order.
    pub fn next(self) -> Self {
        match self {
            Status::NotStarted => Status::InProgress,
            Status::InProgress => Status::Completed,
            Status::Completed => Status::Overdue,
            Status::Overdue => Status::NotStarted,
        }
    }

    /// Checkbox semantics: completed tasks go back to not started,
    /// anything else becomes completed.
    pub fn toggled_complete(self) -> Self {
        match self {
            Status::Completed => Status::NotStarted,
            Status::NotStarted | Status::InProgress | Status::Overdue => Status::Completed,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Status::Completed)
    }
}

impl Task {
    pub fn new(id: TaskId, draft: TaskDraft, date: NaiveDate) -> Self {
        let description = if draft.description.trim().is_empty() {
            None
        } else {
            Some(draft.description)
        };
        Task {
            id,
            title: draft.title,
            description,
            priority: draft.priority,
            status: Status::NotStarted,
            date,
            created_at: Utc::now(),
        }
    }
}

impl Note {
    pub fn new(id: NoteId, content: String, date: NaiveDate) -> Self {
        Note {
            id,
            content,
            date,
            updated_at: Utc::now(),
        }
    }
}

impl ChatMessage {
    pub fn new(id: u64, role: Role, content: impl Into<String>) -> Self {
        ChatMessage {
            id,
            role,
            content: content.into(),
            created_at: Local::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_complete_round_trips_through_not_started() {
        assert_eq!(Status::InProgress.toggled_complete(), Status::Completed);
        assert_eq!(Status::Overdue.toggled_complete(), Status::Completed);
        assert_eq!(Status::Completed.toggled_complete(), Status::NotStarted);
    }

    #[test]
    fn status_cycle_visits_every_variant() {
        let mut seen = vec![Status::NotStarted];
        let mut s = Status::NotStarted.next();
        while s != Status::NotStarted {
            seen.push(s);
            s = s.next();
        }
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn blank_description_is_dropped() {
        let draft = TaskDraft {
            title: "Plan sprint".into(),
            description: "   ".into(),
            priority: Priority::High,
        };
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let task = Task::new("abc123".into(), draft, date);
        assert_eq!(task.description, None);
        assert_eq!(task.status, Status::NotStarted);
        assert_eq!(task.priority, Priority::High);
    }

    #[test]
    fn priority_cycles_are_inverse() {
        for p in Priority::ALL {
            assert_eq!(p.next().prev(), p);
        }
    }
}
