use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Progress of a task through its lifecycle.
///
/// `Completed` is terminal: no task operation moves a task out of it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    /// Returns true if the task still needs work (`Pending` or `InProgress`).
    pub fn is_open(&self) -> bool {
        matches!(self, TaskStatus::Pending | TaskStatus::InProgress)
    }
}

/// A unit of work owned by a creator and optionally assigned to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub due_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    /// The user who created the task.
    pub created_by: Uuid,
    /// The user currently responsible for the task, if any.
    pub assigned_to: Option<Uuid>,
}

impl Task {
    /// Creates a new pending task stamped with the current time.
    pub fn new(title: impl Into<String>, due_date: DateTime<Utc>, created_by: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: None,
            status: TaskStatus::Pending,
            due_date,
            created_at: Utc::now(),
            updated_at: None,
            created_by,
            assigned_to: None,
        }
    }

    /// Sets a specific ID for this task (useful for testing).
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    /// Sets the description for this task.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Assigns this task to a user.
    pub fn with_assignee(mut self, user_id: Uuid) -> Self {
        self.assigned_to = Some(user_id);
        self
    }

    /// Sets the status for this task.
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// Sets the creation timestamp (useful for testing).
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Returns true if the user is the creator or the assignee of this task.
    pub fn involves(&self, user_id: Uuid) -> bool {
        self.created_by == user_id || self.assigned_to == Some(user_id)
    }

    /// Returns true if the task is assigned to `user_id` and still open.
    pub fn is_pending_for(&self, user_id: Uuid) -> bool {
        self.assigned_to == Some(user_id) && self.status.is_open()
    }
}

/// A registered user. Only the username is used by the task services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Creates a new user with the given username and email.
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            email: email.into(),
            first_name: None,
            last_name: None,
            created_at: Utc::now(),
        }
    }

    /// Sets a specific ID for this user (useful for testing).
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    /// Sets the first and last name.
    pub fn with_name(mut self, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        self.first_name = Some(first_name.into());
        self.last_name = Some(last_name.into());
        self
    }
}

/// A task as returned to callers, with user references resolved to names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskView {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub due_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub created_by: Uuid,
    pub created_by_username: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub assigned_to_username: Option<String>,
}

impl TaskView {
    /// Builds a view from a task and the optionally resolved creator/assignee.
    pub fn from_task(task: &Task, creator: Option<&User>, assignee: Option<&User>) -> Self {
        Self {
            id: task.id,
            title: task.title.clone(),
            description: task.description.clone(),
            status: task.status,
            due_date: task.due_date,
            created_at: task.created_at,
            updated_at: task.updated_at,
            created_by: task.created_by,
            created_by_username: creator.map(|u| u.username.clone()),
            assigned_to: task.assigned_to,
            assigned_to_username: assignee.map(|u| u.username.clone()),
        }
    }
}

/// What a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationType {
    TaskAssigned,
    TaskUpdated,
    TaskCompleted,
}

/// A message delivered to a user about one of their tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub message: String,
    pub kind: NotificationType,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    /// The recipient.
    pub user_id: Uuid,
    pub task_id: Uuid,
}

impl Notification {
    /// Creates the unread notification sent when a task is assigned to a user.
    pub fn task_assigned(task: &Task, user_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            message: format!("You have been assigned to task: {}", task.title),
            kind: NotificationType::TaskAssigned,
            is_read: false,
            created_at: Utc::now(),
            user_id,
            task_id: task.id,
        }
    }

    /// Sets the creation timestamp (useful for testing).
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

/// A notification as returned to callers, with the task title resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationView {
    pub id: Uuid,
    pub message: String,
    pub kind: NotificationType,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub task_id: Uuid,
    pub task_title: Option<String>,
}

impl NotificationView {
    /// Builds a view from a notification and its task, if it still exists.
    pub fn from_notification(notification: &Notification, task: Option<&Task>) -> Self {
        Self {
            id: notification.id,
            message: notification.message.clone(),
            kind: notification.kind,
            is_read: notification.is_read,
            created_at: notification.created_at,
            task_id: notification.task_id,
            task_title: task.map(|t| t.title.clone()),
        }
    }
}
