use std::sync::Arc;

use uuid::Uuid;

use taskhub_core::queue::Job;
use taskhub_core::storage::{NotificationRepository, Result, TaskRepository};
use taskhub_core::task::Notification;

/// Executes notification jobs against the repositories.
#[derive(Clone)]
pub struct NotificationWorker {
    tasks: Arc<dyn TaskRepository>,
    notifications: Arc<dyn NotificationRepository>,
}

impl NotificationWorker {
    pub fn new(
        tasks: Arc<dyn TaskRepository>,
        notifications: Arc<dyn NotificationRepository>,
    ) -> Self {
        Self {
            tasks,
            notifications,
        }
    }

    /// Runs a single job. Errors are returned so the pool can retry.
    pub async fn run(&self, job: &Job) -> Result<()> {
        match *job {
            Job::TaskAssigned { task_id, user_id } => {
                self.process_assignment(task_id, user_id).await
            }
        }
    }

    /// Persists the "task assigned" notification for `user_id`.
    ///
    /// A task deleted before the job runs is not an error: nothing is written.
    pub async fn process_assignment(&self, task_id: Uuid, user_id: Uuid) -> Result<()> {
        let Some(task) = self.tasks.get_task(task_id).await? else {
            tracing::warn!(%task_id, %user_id, "Cannot create notification: task not found");
            return Ok(());
        };

        let notification = Notification::task_assigned(&task, user_id);
        self.notifications
            .create_notification(&notification)
            .await?;

        tracing::info!(
            notification_id = %notification.id,
            %task_id,
            %user_id,
            "Notification created"
        );
        Ok(())
    }
}
