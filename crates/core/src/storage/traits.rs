use async_trait::async_trait;
use uuid::Uuid;

use crate::task::{Notification, Task, User};

use super::Result;

/// Repository for task operations.
///
/// Logically deleted tasks are invisible to every query except
/// [`list_deleted_tasks`](TaskRepository::list_deleted_tasks).
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Gets a task by its ID.
    async fn get_task(&self, id: Uuid) -> Result<Option<Task>>;

    /// Gets every task.
    async fn list_tasks(&self) -> Result<Vec<Task>>;

    /// Gets open (`Pending` or `InProgress`) tasks assigned to a user.
    async fn list_pending_tasks_for_user(&self, user_id: Uuid) -> Result<Vec<Task>>;

    /// Gets tasks the user created or is assigned to.
    async fn list_tasks_for_user(&self, user_id: Uuid) -> Result<Vec<Task>>;

    /// Creates a new task.
    async fn create_task(&self, task: &Task) -> Result<()>;

    /// Replaces an existing task. Timestamps are stored as given.
    async fn update_task(&self, task: &Task) -> Result<()>;

    /// Logically deletes a task by its ID.
    async fn delete_task(&self, id: Uuid) -> Result<()>;

    /// Gets every logically deleted task.
    async fn list_deleted_tasks(&self) -> Result<Vec<Task>>;

    /// Makes a logically deleted task visible again.
    async fn restore_task(&self, id: Uuid) -> Result<()>;
}

/// Repository for user operations.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Gets a user by their ID.
    async fn get_user(&self, id: Uuid) -> Result<Option<User>>;

    /// Creates a new user.
    async fn create_user(&self, user: &User) -> Result<()>;
}

/// Repository for notification operations.
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Gets a notification by its ID.
    async fn get_notification(&self, id: Uuid) -> Result<Option<Notification>>;

    /// Creates a new notification.
    async fn create_notification(&self, notification: &Notification) -> Result<()>;

    /// Replaces an existing notification.
    async fn update_notification(&self, notification: &Notification) -> Result<()>;

    /// Gets all notifications for a user, newest first.
    async fn list_notifications_for_user(&self, user_id: Uuid) -> Result<Vec<Notification>>;

    /// Gets unread notifications for a user, newest first.
    async fn list_unread_notifications_for_user(&self, user_id: Uuid)
        -> Result<Vec<Notification>>;
}
