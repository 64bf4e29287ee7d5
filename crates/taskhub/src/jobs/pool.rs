//! Notification worker pool.
//!
//! Each worker is a tokio task looping on `dequeue`. A failed job is handed
//! back to the queue as a scheduled retry with the attempt counter bumped; a
//! job that used up its attempts is dead-lettered. The dequeued job is acked
//! only once its outcome is recorded, so a crash in between redelivers it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use taskhub_core::queue::{JobEnvelope, JobQueue, RetryPolicy};

use super::NotificationWorker;

/// A fixed-size pool of notification workers.
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
    shutdown_tx: watch::Sender<bool>,
}

/// Everything a single worker loop needs.
#[derive(Clone)]
struct WorkerContext {
    queue: Arc<dyn JobQueue>,
    worker: NotificationWorker,
    policy: RetryPolicy,
    poll_interval: Duration,
}

impl WorkerPool {
    /// Spawns `worker_count` workers (at least one) draining `queue`.
    ///
    /// Idle workers wake every `poll_interval` to check for shutdown.
    pub fn spawn(
        queue: Arc<dyn JobQueue>,
        worker: NotificationWorker,
        policy: RetryPolicy,
        worker_count: usize,
        poll_interval: Duration,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let context = WorkerContext {
            queue,
            worker,
            policy,
            poll_interval,
        };

        let handles = (0..worker_count.max(1))
            .map(|idx| tokio::spawn(run_worker(idx, context.clone(), shutdown_rx.clone())))
            .collect();
        let pool = Self {
            handles,
            shutdown_tx,
        };

        tracing::info!(
            worker_count = pool.worker_count(),
            max_attempts = policy.max_attempts,
            "Notification worker pool started"
        );
        pool
    }

    /// Number of running workers.
    pub fn worker_count(&self) -> usize {
        self.handles.len()
    }

    /// Stops the workers and waits for in-flight jobs to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);

        for handle in self.handles {
            if let Err(err) = handle.await {
                tracing::error!(error = %err, "Notification worker panicked");
            }
        }

        tracing::info!("Notification worker pool stopped");
    }
}

async fn run_worker(idx: usize, context: WorkerContext, shutdown_rx: watch::Receiver<bool>) {
    tracing::debug!(worker = idx, "Notification worker started");

    while !*shutdown_rx.borrow() {
        // Not raced against shutdown: dropping a Redis BLMOVE mid-flight can strand a job.
        match context.queue.dequeue(context.poll_interval).await {
            Ok(Some(envelope)) => handle_envelope(idx, &context, envelope).await,
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(worker = idx, error = %err, "Failed to dequeue job");
                tokio::time::sleep(context.poll_interval).await;
            }
        }
    }

    tracing::debug!(worker = idx, "Notification worker stopped");
}

async fn handle_envelope(idx: usize, context: &WorkerContext, envelope: JobEnvelope) {
    let recorded = match context.worker.run(&envelope.job).await {
        Ok(()) => {
            tracing::debug!(
                worker = idx,
                job_id = %envelope.id,
                attempt = envelope.attempt,
                "Job completed"
            );
            true
        }
        Err(err) if envelope.can_retry() => {
            schedule_retry(idx, context, &envelope, err.to_string()).await
        }
        Err(err) => dead_letter(idx, context, &envelope, err.to_string()).await,
    };

    // Left in flight otherwise, to be redelivered by `recover_in_flight`.
    if recorded {
        if let Err(err) = context.queue.ack(&envelope).await {
            tracing::error!(job_id = %envelope.id, error = %err, "Failed to ack job");
        }
    }
}

async fn schedule_retry(
    idx: usize,
    context: &WorkerContext,
    envelope: &JobEnvelope,
    error: String,
) -> bool {
    let delay = context.policy.delay_for(envelope.attempt);
    let retry = envelope.next_attempt(error);
    tracing::warn!(
        worker = idx,
        job_id = %retry.id,
        failed_attempt = envelope.attempt,
        max_attempts = envelope.max_attempts,
        delay_ms = delay.as_millis() as u64,
        error = retry.last_error.as_deref().unwrap_or_default(),
        "Job failed, scheduling retry"
    );

    match context.queue.schedule(&retry, delay).await {
        Ok(()) => true,
        Err(err) => {
            tracing::error!(job_id = %retry.id, error = %err, "Failed to schedule retry");
            false
        }
    }
}

async fn dead_letter(
    idx: usize,
    context: &WorkerContext,
    envelope: &JobEnvelope,
    error: String,
) -> bool {
    let failed = envelope.failed(error);
    tracing::error!(
        worker = idx,
        job_id = %failed.id,
        job = ?failed.job,
        attempts = failed.attempt,
        error = failed.last_error.as_deref().unwrap_or_default(),
        "Job failed permanently, moving to dead letters"
    );

    match context.queue.dead_letter(&failed).await {
        Ok(()) => true,
        Err(err) => {
            tracing::error!(job_id = %failed.id, error = %err, "Failed to dead-letter job");
            false
        }
    }
}
