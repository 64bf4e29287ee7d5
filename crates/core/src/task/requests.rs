//! API request types for task operations.
//!
//! Pure data types with no I/O. Validation happens in [`validate_title`](super::validate_title).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::serde::deserialize_optional_string;

use super::error::TaskError;
use super::operations::validate_title;

/// Request payload for creating a new task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    pub due_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<Uuid>,
}

impl CreateTaskRequest {
    /// Create a new request with a title and due date.
    pub fn new(title: impl Into<String>, due_date: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            description: None,
            due_date,
            assigned_to: None,
        }
    }

    /// Set the task description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Assign the new task to a user.
    pub fn with_assignee(mut self, user_id: Uuid) -> Self {
        self.assigned_to = Some(user_id);
        self
    }

    /// Validates the request payload.
    pub fn validate(&self) -> Result<(), TaskError> {
        validate_title(&self.title)
    }
}

/// Request payload for updating a task's descriptive fields.
///
/// Status is deliberately absent: updates never change it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: String,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    pub due_date: DateTime<Utc>,
}

impl UpdateTaskRequest {
    /// Create a new request with a title and due date.
    pub fn new(title: impl Into<String>, due_date: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            description: None,
            due_date,
        }
    }

    /// Set the task description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Validates the request payload.
    pub fn validate(&self) -> Result<(), TaskError> {
        validate_title(&self.title)
    }
}

/// Request payload for (re)assigning a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignTaskRequest {
    pub assigned_to: Uuid,
}
