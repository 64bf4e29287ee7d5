use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use taskhub_core::storage::{NotificationRepository, TaskRepository};
use taskhub_core::task::{Notification, NotificationView, Task};

use super::{Result, ServiceError};

/// Read side of notifications. Nothing here is cached.
#[derive(Clone)]
pub struct NotificationService {
    notifications: Arc<dyn NotificationRepository>,
    tasks: Arc<dyn TaskRepository>,
}

impl NotificationService {
    pub fn new(
        notifications: Arc<dyn NotificationRepository>,
        tasks: Arc<dyn TaskRepository>,
    ) -> Self {
        Self {
            notifications,
            tasks,
        }
    }

    /// All of the user's notifications, newest first.
    pub async fn get_notifications(&self, user_id: Uuid) -> Result<Vec<NotificationView>> {
        let notifications = self
            .notifications
            .list_notifications_for_user(user_id)
            .await?;
        self.to_views(&notifications).await
    }

    /// The user's unread notifications, newest first.
    pub async fn get_unread(&self, user_id: Uuid) -> Result<Vec<NotificationView>> {
        let notifications = self
            .notifications
            .list_unread_notifications_for_user(user_id)
            .await?;
        self.to_views(&notifications).await
    }

    /// Marks a notification read. Marking it again is a no-op.
    pub async fn mark_read(&self, id: Uuid) -> Result<NotificationView> {
        let mut notification = self
            .notifications
            .get_notification(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Notification", id))?;

        if !notification.is_read {
            notification.is_read = true;
            self.notifications
                .update_notification(&notification)
                .await?;
            tracing::debug!(notification_id = %id, "Notification marked read");
        }

        let task = self.tasks.get_task(notification.task_id).await?;
        Ok(NotificationView::from_notification(
            &notification,
            task.as_ref(),
        ))
    }

    async fn to_views(&self, notifications: &[Notification]) -> Result<Vec<NotificationView>> {
        let mut tasks: HashMap<Uuid, Option<Task>> = HashMap::new();
        for notification in notifications {
            if let Entry::Vacant(slot) = tasks.entry(notification.task_id) {
                slot.insert(self.tasks.get_task(notification.task_id).await?);
            }
        }

        Ok(notifications
            .iter()
            .map(|notification| {
                let task = tasks.get(&notification.task_id).and_then(Option::as_ref);
                NotificationView::from_notification(notification, task)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryRepository;
    use chrono::{Duration, Utc};

    fn service(repo: &InMemoryRepository) -> NotificationService {
        NotificationService::new(Arc::new(repo.clone()), Arc::new(repo.clone()))
    }

    async fn seed(
        repo: &InMemoryRepository,
        title: &str,
        user_id: Uuid,
        age_minutes: i64,
    ) -> Notification {
        let task = Task::new(title, Utc::now(), Uuid::new_v4()).with_assignee(user_id);
        repo.create_task(&task).await.unwrap();
        let notification = Notification::task_assigned(&task, user_id)
            .with_created_at(Utc::now() - Duration::minutes(age_minutes));
        repo.create_notification(&notification).await.unwrap();
        notification
    }

    #[tokio::test]
    async fn test_get_notifications_newest_first_with_task_titles() {
        let repo = InMemoryRepository::new();
        let user_id = Uuid::new_v4();
        let older = seed(&repo, "Older", user_id, 10).await;
        let newer = seed(&repo, "Newer", user_id, 1).await;
        seed(&repo, "Someone else", Uuid::new_v4(), 0).await;

        let views = service(&repo).get_notifications(user_id).await.unwrap();

        assert_eq!(
            views.iter().map(|v| v.id).collect::<Vec<_>>(),
            vec![newer.id, older.id]
        );
        assert_eq!(views[0].task_title.as_deref(), Some("Newer"));
        assert_eq!(views[1].task_title.as_deref(), Some("Older"));
    }

    #[tokio::test]
    async fn test_deleted_task_leaves_title_absent() {
        let repo = InMemoryRepository::new();
        let user_id = Uuid::new_v4();
        let notification = seed(&repo, "Dropped", user_id, 0).await;
        repo.delete_task(notification.task_id).await.unwrap();

        let views = service(&repo).get_notifications(user_id).await.unwrap();

        assert_eq!(views.len(), 1);
        assert!(views[0].task_title.is_none());
    }

    #[tokio::test]
    async fn test_mark_read_removes_from_unread_and_is_idempotent() {
        let repo = InMemoryRepository::new();
        let user_id = Uuid::new_v4();
        let first = seed(&repo, "First", user_id, 5).await;
        let second = seed(&repo, "Second", user_id, 1).await;
        let service = service(&repo);

        let view = service.mark_read(first.id).await.unwrap();
        let again = service.mark_read(first.id).await.unwrap();
        let unread = service.get_unread(user_id).await.unwrap();

        assert!(view.is_read);
        assert!(again.is_read);
        assert_eq!(view.task_title.as_deref(), Some("First"));
        assert_eq!(
            unread.iter().map(|v| v.id).collect::<Vec<_>>(),
            vec![second.id]
        );
        assert_eq!(service.get_notifications(user_id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_mark_read_missing_notification_is_not_found() {
        let repo = InMemoryRepository::new();
        let id = Uuid::new_v4();

        let result = service(&repo).mark_read(id).await;

        assert_eq!(result, Err(ServiceError::not_found("Notification", id)));
    }
}
