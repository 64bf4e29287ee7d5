//! Process-local job queue.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;
use uuid::Uuid;

use taskhub_core::queue::{JobEnvelope, JobQueue, Result};

/// In-memory FIFO job queue.
///
/// Jobs are lost on restart. Idle consumers park on a `Notify` instead of
/// polling, so an enqueue wakes exactly one waiting worker.
#[derive(Debug, Clone, Default)]
pub struct MemoryJobQueue {
    state: Arc<Mutex<QueueState>>,
    ready: Arc<Notify>,
}

#[derive(Debug, Default)]
struct QueueState {
    pending: VecDeque<JobEnvelope>,
    /// Retries waiting out their backoff, with the instant they become ready.
    scheduled: Vec<(Instant, JobEnvelope)>,
    in_flight: HashMap<(Uuid, u32), JobEnvelope>,
    failed: Vec<JobEnvelope>,
}

impl QueueState {
    /// Moves due retries onto the pending list. Returns the next due instant, if any.
    fn promote_due(&mut self, now: Instant) -> Option<Instant> {
        let (mut due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.scheduled)
            .into_iter()
            .partition(|(at, _)| *at <= now);
        self.scheduled = waiting;

        due.sort_by_key(|(at, _)| *at);
        self.pending.extend(due.into_iter().map(|(_, envelope)| envelope));

        self.scheduled.iter().map(|(at, _)| *at).min()
    }
}

impl MemoryJobQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn in_flight_count(&self) -> usize {
        self.state.lock().await.in_flight.len()
    }
}

#[async_trait]
impl JobQueue for MemoryJobQueue {
    async fn enqueue(&self, envelope: &JobEnvelope) -> Result<()> {
        self.state.lock().await.pending.push_back(envelope.clone());
        self.ready.notify_one();
        Ok(())
    }

    async fn schedule(&self, envelope: &JobEnvelope, delay: Duration) -> Result<()> {
        let at = Instant::now() + delay;
        self.state.lock().await.scheduled.push((at, envelope.clone()));
        Ok(())
    }

    async fn dequeue(&self, timeout: Duration) -> Result<Option<JobEnvelope>> {
        let deadline = Instant::now() + timeout;

        loop {
            let next_due = {
                let mut state = self.state.lock().await;
                let next_due = state.promote_due(Instant::now());
                if let Some(envelope) = state.pending.pop_front() {
                    state
                        .in_flight
                        .insert((envelope.id, envelope.attempt), envelope.clone());
                    return Ok(Some(envelope));
                }
                next_due
            };

            // Wake early when a scheduled retry comes due.
            let wake_at = next_due.map_or(deadline, |at| at.min(deadline));
            let notified = tokio::time::timeout_at(wake_at, self.ready.notified()).await;
            if notified.is_err() && wake_at >= deadline {
                return Ok(None);
            }
        }
    }

    async fn ack(&self, envelope: &JobEnvelope) -> Result<()> {
        self.state
            .lock()
            .await
            .in_flight
            .remove(&(envelope.id, envelope.attempt));
        Ok(())
    }

    async fn recover_in_flight(&self) -> Result<usize> {
        let mut state = self.state.lock().await;
        let recovered: Vec<_> = state.in_flight.drain().map(|(_, envelope)| envelope).collect();
        let count = recovered.len();
        state.pending.extend(recovered);
        drop(state);

        if count > 0 {
            self.ready.notify_waiters();
        }
        Ok(count)
    }

    async fn dead_letter(&self, envelope: &JobEnvelope) -> Result<()> {
        self.state.lock().await.failed.push(envelope.clone());
        Ok(())
    }

    async fn dead_letters(&self) -> Result<Vec<JobEnvelope>> {
        Ok(self.state.lock().await.failed.clone())
    }

    async fn pending_count(&self) -> Result<usize> {
        let state = self.state.lock().await;
        Ok(state.pending.len() + state.scheduled.len())
    }
}
