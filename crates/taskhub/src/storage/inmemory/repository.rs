//! In-memory repository implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use taskhub_core::storage::{
    NotificationRepository, RepositoryError, Result, TaskRepository, UserRepository,
};
use taskhub_core::task::{filter_pending_for_user, filter_tasks_for_user, Notification, Task, User};

/// A task plus its soft-delete tombstone.
#[derive(Debug, Clone)]
struct StoredTask {
    task: Task,
    is_deleted: bool,
}

/// In-memory storage backend.
///
/// Uses HashMaps wrapped in `Arc<RwLock<_>>` for thread-safe access.
/// Data is not persisted and will be lost when the repository is dropped.
#[derive(Debug, Clone)]
pub struct InMemoryRepository {
    tasks: Arc<RwLock<HashMap<Uuid, StoredTask>>>,
    users: Arc<RwLock<HashMap<Uuid, User>>>,
    notifications: Arc<RwLock<HashMap<Uuid, Notification>>>,
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRepository {
    /// Creates a new empty in-memory repository.
    pub fn new() -> Self {
        Self {
            tasks: Arc::new(RwLock::new(HashMap::new())),
            users: Arc::new(RwLock::new(HashMap::new())),
            notifications: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Returns every task that is not soft-deleted, oldest first.
    async fn live_tasks(&self) -> Vec<Task> {
        let tasks = self.tasks.read().await;
        let mut result: Vec<Task> = tasks
            .values()
            .filter(|stored| !stored.is_deleted)
            .map(|stored| stored.task.clone())
            .collect();
        result.sort_by_key(|task| task.created_at);
        result
    }

    /// Returns the user's notifications matching `predicate`, newest first.
    async fn notifications_for<F>(&self, user_id: Uuid, predicate: F) -> Vec<Notification>
    where
        F: Fn(&Notification) -> bool,
    {
        let notifications = self.notifications.read().await;
        let mut result: Vec<Notification> = notifications
            .values()
            .filter(|n| n.user_id == user_id && predicate(n))
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        result
    }
}

fn task_not_found(id: Uuid) -> RepositoryError {
    RepositoryError::NotFound {
        entity_type: "Task",
        id: id.to_string(),
    }
}

#[async_trait]
impl TaskRepository for InMemoryRepository {
    async fn get_task(&self, id: Uuid) -> Result<Option<Task>> {
        let tasks = self.tasks.read().await;
        Ok(tasks
            .get(&id)
            .filter(|stored| !stored.is_deleted)
            .map(|stored| stored.task.clone()))
    }

    async fn list_tasks(&self) -> Result<Vec<Task>> {
        Ok(self.live_tasks().await)
    }

    async fn list_pending_tasks_for_user(&self, user_id: Uuid) -> Result<Vec<Task>> {
        let tasks = self.live_tasks().await;
        Ok(filter_pending_for_user(&tasks, user_id)
            .into_iter()
            .cloned()
            .collect())
    }

    async fn list_tasks_for_user(&self, user_id: Uuid) -> Result<Vec<Task>> {
        let tasks = self.live_tasks().await;
        Ok(filter_tasks_for_user(&tasks, user_id)
            .into_iter()
            .cloned()
            .collect())
    }

    async fn create_task(&self, task: &Task) -> Result<()> {
        let mut tasks = self.tasks.write().await;
        if tasks.contains_key(&task.id) {
            return Err(RepositoryError::AlreadyExists {
                entity_type: "Task",
                id: task.id.to_string(),
            });
        }
        tasks.insert(
            task.id,
            StoredTask {
                task: task.clone(),
                is_deleted: false,
            },
        );
        Ok(())
    }

    async fn update_task(&self, task: &Task) -> Result<()> {
        let mut tasks = self.tasks.write().await;
        match tasks.get_mut(&task.id) {
            Some(stored) if !stored.is_deleted => {
                stored.task = task.clone();
                Ok(())
            }
            _ => Err(task_not_found(task.id)),
        }
    }

    async fn delete_task(&self, id: Uuid) -> Result<()> {
        let mut tasks = self.tasks.write().await;
        match tasks.get_mut(&id) {
            Some(stored) if !stored.is_deleted => {
                stored.is_deleted = true;
                Ok(())
            }
            _ => Err(task_not_found(id)),
        }
    }

    async fn list_deleted_tasks(&self) -> Result<Vec<Task>> {
        let tasks = self.tasks.read().await;
        let mut result: Vec<Task> = tasks
            .values()
            .filter(|stored| stored.is_deleted)
            .map(|stored| stored.task.clone())
            .collect();
        result.sort_by_key(|task| task.created_at);
        Ok(result)
    }

    async fn restore_task(&self, id: Uuid) -> Result<()> {
        let mut tasks = self.tasks.write().await;
        match tasks.get_mut(&id) {
            Some(stored) if stored.is_deleted => {
                stored.is_deleted = false;
                Ok(())
            }
            _ => Err(task_not_found(id)),
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }

    async fn create_user(&self, user: &User) -> Result<()> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.id) {
            return Err(RepositoryError::AlreadyExists {
                entity_type: "User",
                id: user.id.to_string(),
            });
        }
        if users.values().any(|u| u.username == user.username) {
            return Err(RepositoryError::AlreadyExists {
                entity_type: "User",
                id: user.username.clone(),
            });
        }
        users.insert(user.id, user.clone());
        Ok(())
    }
}

#[async_trait]
impl NotificationRepository for InMemoryRepository {
    async fn get_notification(&self, id: Uuid) -> Result<Option<Notification>> {
        let notifications = self.notifications.read().await;
        Ok(notifications.get(&id).cloned())
    }

    async fn create_notification(&self, notification: &Notification) -> Result<()> {
        let mut notifications = self.notifications.write().await;
        if notifications.contains_key(&notification.id) {
            return Err(RepositoryError::AlreadyExists {
                entity_type: "Notification",
                id: notification.id.to_string(),
            });
        }
        notifications.insert(notification.id, notification.clone());
        Ok(())
    }

    async fn update_notification(&self, notification: &Notification) -> Result<()> {
        let mut notifications = self.notifications.write().await;
        if !notifications.contains_key(&notification.id) {
            return Err(RepositoryError::NotFound {
                entity_type: "Notification",
                id: notification.id.to_string(),
            });
        }
        notifications.insert(notification.id, notification.clone());
        Ok(())
    }

    async fn list_notifications_for_user(&self, user_id: Uuid) -> Result<Vec<Notification>> {
        Ok(self.notifications_for(user_id, |_| true).await)
    }

    async fn list_unread_notifications_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Notification>> {
        Ok(self.notifications_for(user_id, |n| !n.is_read).await)
    }
}
