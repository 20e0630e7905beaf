use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{UserId, flexible_date};

pub type TaskId = Uuid;
pub type EventId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            _ => None,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub owner: UserId,
    pub title: String,
    pub description: Option<String>,
    #[serde(with = "flexible_date::option")]
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Priority,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn new(owner: UserId, title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            title: title.into(),
            description: None,
            due_date: None,
            priority: Priority::default(),
            completed: false,
            created_at: Utc::now(),
        }
    }

    /// Open and past its due date.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.completed && self.due_date.is_some_and(|due| due < now)
    }
}

/// Partial update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Option<Priority>,
    pub completed: Option<bool>,
}

impl TaskChanges {
    pub fn apply(self, task: &mut Task) {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = Some(description);
        }
        if let Some(due_date) = self.due_date {
            task.due_date = Some(due_date);
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    pub owner: UserId,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    #[serde(with = "flexible_date")]
    pub start: DateTime<Utc>,
    #[serde(with = "flexible_date")]
    pub end: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Event {
    pub fn new(
        owner: UserId,
        title: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            title: title.into(),
            description: None,
            location: None,
            start,
            end,
            created_at: Utc::now(),
        }
    }

    pub fn is_well_formed(&self) -> bool {
        !self.title.trim().is_empty() && self.end >= self.start
    }
}

#[derive(Debug, Clone, Default)]
pub struct EventChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl EventChanges {
    pub fn apply(self, event: &mut Event) {
        if let Some(title) = self.title {
            event.title = title;
        }
        if let Some(description) = self.description {
            event.description = Some(description);
        }
        if let Some(location) = self.location {
            event.location = Some(location);
        }
        if let Some(start) = self.start {
            event.start = start;
        }
        if let Some(end) = self.end {
            event.end = end;
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn test_priority_roundtrip() {
        for p in [Priority::Low, Priority::Medium, Priority::High] {
            assert_eq!(Priority::from_str(p.as_str()), Some(p));
        }
        assert_eq!(Priority::from_str("urgent"), None);
    }

    #[test]
    fn test_overdue() {
        let now = Utc::now();
        let mut task = Task::new(Uuid::new_v4(), "File taxes");
        assert!(!task.is_overdue(now));

        task.due_date = Some(now - Duration::days(1));
        assert!(task.is_overdue(now));

        task.completed = true;
        assert!(!task.is_overdue(now));
    }

    #[test]
    fn test_task_changes_are_partial() {
        let mut task = Task::new(Uuid::new_v4(), "Call mom");
        task.description = Some("Sunday".into());

        TaskChanges {
            completed: Some(true),
            ..Default::default()
        }
        .apply(&mut task);

        assert!(task.completed);
        assert_eq!(task.title, "Call mom");
        assert_eq!(task.description.as_deref(), Some("Sunday"));
    }

    #[test]
    fn test_event_end_before_start_is_malformed() {
        let now = Utc::now();
        let mut event = Event::new(Uuid::new_v4(), "Standup", now, now + Duration::minutes(15));
        assert!(event.is_well_formed());

        EventChanges {
            end: Some(now - Duration::minutes(1)),
            ..Default::default()
        }
        .apply(&mut event);
        assert!(!event.is_well_formed());
    }
}
