use std::time::Duration;

use async_trait::async_trait;

use super::{JobEnvelope, Result};

/// A durable, at-least-once job queue.
///
/// A dequeued job stays in flight until it is acknowledged. Jobs left in
/// flight by a crashed consumer are handed out again by [`JobQueue::recover_in_flight`].
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Adds a job to the back of the queue.
    async fn enqueue(&self, envelope: &JobEnvelope) -> Result<()>;

    /// Adds a job that becomes ready once `delay` has elapsed.
    async fn schedule(&self, envelope: &JobEnvelope, delay: Duration) -> Result<()>;

    /// Takes the next ready job, waiting up to `timeout` for one to arrive.
    ///
    /// The job is in flight until [`JobQueue::ack`] is called for it.
    async fn dequeue(&self, timeout: Duration) -> Result<Option<JobEnvelope>>;

    /// Marks an in-flight job as done with.
    async fn ack(&self, envelope: &JobEnvelope) -> Result<()>;

    /// Returns every in-flight job to the queue. Returns how many were moved.
    async fn recover_in_flight(&self) -> Result<usize>;

    /// Records a job that exhausted its attempts.
    async fn dead_letter(&self, envelope: &JobEnvelope) -> Result<()>;

    /// Returns every dead-lettered job.
    async fn dead_letters(&self) -> Result<Vec<JobEnvelope>>;

    /// Returns the number of jobs waiting to be processed, scheduled ones included.
    async fn pending_count(&self) -> Result<usize>;
}
