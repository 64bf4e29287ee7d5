use std::sync::Arc;

use uuid::Uuid;

use taskhub_core::queue::{Job, JobEnvelope, JobQueue, QueueError};

/// Enqueues notification jobs without waiting for them to run.
#[derive(Clone)]
pub struct NotificationDispatcher {
    queue: Arc<dyn JobQueue>,
    max_attempts: u32,
}

impl NotificationDispatcher {
    /// Creates a dispatcher whose jobs get `max_attempts` attempts each.
    pub fn new(queue: Arc<dyn JobQueue>, max_attempts: u32) -> Self {
        Self {
            queue,
            max_attempts,
        }
    }

    /// Schedules a "task assigned" notification for `user_id`.
    ///
    /// Returns once the job is durably enqueued. Delivery happens later on the
    /// worker pool and cannot be cancelled.
    pub async fn notify(&self, task_id: Uuid, user_id: Uuid) -> Result<(), QueueError> {
        let envelope = JobEnvelope::new(Job::TaskAssigned { task_id, user_id }, self.max_attempts);
        self.queue.enqueue(&envelope).await?;

        tracing::debug!(
            job_id = %envelope.id,
            %task_id,
            %user_id,
            "Enqueued assignment notification"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::MemoryJobQueue;
    use std::time::Duration;

    #[tokio::test]
    async fn test_notify_enqueues_one_job_with_max_attempts() {
        let queue = Arc::new(MemoryJobQueue::new());
        let dispatcher = NotificationDispatcher::new(queue.clone(), 3);
        let task_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        dispatcher.notify(task_id, user_id).await.unwrap();

        assert_eq!(queue.pending_count().await.unwrap(), 1);
        let envelope = queue
            .dequeue(Duration::from_millis(10))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(envelope.job, Job::TaskAssigned { task_id, user_id });
        assert_eq!(envelope.attempt, 1);
        assert_eq!(envelope.max_attempts, 3);
    }
}
