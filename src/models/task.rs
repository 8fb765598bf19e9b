use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::ListId;

/// Row identifier of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct TaskId(pub i64);

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Represents a task entity as stored in the `tasks` table.
#[derive(Debug, Clone, FromRow)]
pub struct Task {
    /// Unique identifier for the task.
    pub id: TaskId,
    /// The title of the task.
    pub title: String,
    /// Free-form description, empty when none was given.
    pub description: String,
    /// Due date exactly as entered in the form (e.g. `2024-01-01`).
    pub due_date: String,
    /// Whether the task is done. Always `false` on creation.
    pub completed: bool,
    /// The list this task belongs to.
    pub list_id: ListId,
    /// Timestamp of when the task was created.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last update to the task.
    pub updated_at: DateTime<Utc>,
}

/// Values needed to insert a task.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub due_date: String,
    pub list_id: ListId,
}

/// Form submitted to `POST /task_add`.
///
/// `list_id` is kept as text and parsed by the handler so a malformed id is
/// answered with `400 Invalid list ID`.
#[derive(Debug, Deserialize, Validate)]
pub struct TaskForm {
    #[serde(default)]
    pub list_id: String,

    /// Must be between 1 and 200 characters.
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "Task title must be 1 to 200 characters"))]
    pub task_title: String,

    /// Maximum length of 1000 characters.
    #[serde(default)]
    #[validate(length(max = 1000, message = "Task description must be at most 1000 characters"))]
    pub task_description: String,

    #[serde(default)]
    pub task_date: String,
}

impl TaskForm {
    /// Builds the insert values once the list id has been parsed.
    pub fn into_new_task(self, list_id: ListId) -> NewTask {
        NewTask {
            title: self.task_title,
            description: self.task_description,
            due_date: self.task_date,
            list_id,
        }
    }
}
