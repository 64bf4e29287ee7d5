//! Redis list-backed job queue.
//!
//! Producers `LPUSH` onto `{prefix}jobs:notifications` and consumers `BLMOVE`
//! from its tail into `{prefix}jobs:processing`, giving FIFO order. A job is
//! removed from the processing list only when it is acknowledged, so a crash
//! mid-job leaves it there for [`JobQueue::recover_in_flight`].
//!
//! Retries wait in the `{prefix}jobs:scheduled` sorted set, scored by the
//! unix millisecond they become due, and are moved back onto the pending list
//! by whichever consumer dequeues next. Blocking moves run on dedicated
//! connections so they never stall producers sharing the connection manager.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use redis::aio::{ConnectionManager, MultiplexedConnection};
use redis::{AsyncCommands, Direction, Script};
use tokio::sync::Mutex;
use uuid::Uuid;

use taskhub_core::queue::{
    deserialize_envelope, serialize_envelope, JobEnvelope, JobQueue, Result,
};

use super::error::map_redis_error;

/// Smallest blocking timeout sent to Redis; zero would block forever.
const MIN_BLOCK_SECONDS: f64 = 0.01;

/// Most scheduled jobs promoted by a single dequeue.
const PROMOTE_BATCH: usize = 100;

/// Moves due members of KEYS[1] onto the head of list KEYS[2].
const PROMOTE_DUE_SCRIPT: &str = r"
local due = redis.call('ZRANGEBYSCORE', KEYS[1], '-inf', ARGV[1], 'LIMIT', 0, ARGV[2])
for _, payload in ipairs(due) do
    redis.call('ZREM', KEYS[1], payload)
    redis.call('LPUSH', KEYS[2], payload)
end
return #due
";

/// Redis job queue backend.
#[derive(Clone)]
pub struct RedisJobQueue {
    client: redis::Client,
    conn: ConnectionManager,
    /// Idle consumer connections reused across `dequeue` calls.
    consumers: Arc<Mutex<Vec<MultiplexedConnection>>>,
    /// Raw payloads of jobs this process has in flight, keyed by job id and attempt.
    receipts: Arc<Mutex<HashMap<(Uuid, u32), String>>>,
    promote: Arc<Script>,
    pending_key: String,
    processing_key: String,
    scheduled_key: String,
    failed_key: String,
}

impl RedisJobQueue {
    /// Connects to Redis and namespaces the queue keys with `prefix`.
    ///
    /// # Errors
    ///
    /// Returns `QueueError::ConnectionFailed` if the connection cannot be established.
    pub async fn new(url: &str, prefix: &str) -> Result<Self> {
        let client = redis::Client::open(url).map_err(map_redis_error)?;
        let conn = ConnectionManager::new(client.clone())
            .await
            .map_err(map_redis_error)?;
        Ok(Self::from_parts(client, conn, prefix))
    }

    /// Builds a queue from an existing client and producer connection.
    pub fn from_parts(client: redis::Client, conn: ConnectionManager, prefix: &str) -> Self {
        Self {
            client,
            conn,
            consumers: Arc::new(Mutex::new(Vec::new())),
            receipts: Arc::new(Mutex::new(HashMap::new())),
            promote: Arc::new(Script::new(PROMOTE_DUE_SCRIPT)),
            pending_key: format!("{}jobs:notifications", prefix),
            processing_key: format!("{}jobs:processing", prefix),
            scheduled_key: format!("{}jobs:scheduled", prefix),
            failed_key: format!("{}jobs:failed", prefix),
        }
    }

    async fn take_consumer(&self) -> Result<MultiplexedConnection> {
        if let Some(conn) = self.consumers.lock().await.pop() {
            return Ok(conn);
        }
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(map_redis_error)
    }

    async fn return_consumer(&self, conn: MultiplexedConnection) {
        self.consumers.lock().await.push(conn);
    }

    async fn promote_due(&self) -> Result<usize> {
        let mut conn = self.conn.clone();
        let moved: usize = self
            .promote
            .key(&self.scheduled_key)
            .key(&self.pending_key)
            .arg(Utc::now().timestamp_millis())
            .arg(PROMOTE_BATCH)
            .invoke_async(&mut conn)
            .await
            .map_err(map_redis_error)?;

        if moved > 0 {
            tracing::debug!(queue = %self.pending_key, moved, "Promoted scheduled jobs");
        }
        Ok(moved)
    }

    /// Parks an unreadable payload in the dead-letter list.
    async fn dead_letter_raw(&self, payload: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = redis::pipe()
            .atomic()
            .lpush(&self.failed_key, payload)
            .ignore()
            .lrem(&self.processing_key, 1, payload)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(map_redis_error)?;
        Ok(())
    }
}

#[async_trait]
impl JobQueue for RedisJobQueue {
    async fn enqueue(&self, envelope: &JobEnvelope) -> Result<()> {
        let payload = serialize_envelope(envelope)?;
        let mut conn = self.conn.clone();
        conn.lpush::<_, _, ()>(&self.pending_key, payload)
            .await
            .map_err(map_redis_error)?;
        Ok(())
    }

    async fn schedule(&self, envelope: &JobEnvelope, delay: Duration) -> Result<()> {
        let payload = serialize_envelope(envelope)?;
        let due_at = Utc::now().timestamp_millis() + delay.as_millis() as i64;
        let mut conn = self.conn.clone();
        conn.zadd::<_, _, _, ()>(&self.scheduled_key, payload, due_at)
            .await
            .map_err(map_redis_error)?;
        Ok(())
    }

    async fn dequeue(&self, timeout: Duration) -> Result<Option<JobEnvelope>> {
        self.promote_due().await?;

        let mut conn = self.take_consumer().await?;
        let seconds = timeout.as_secs_f64().max(MIN_BLOCK_SECONDS);

        // A failed connection is dropped rather than returned to the pool.
        let moved: Option<String> = conn
            .blmove(
                &self.pending_key,
                &self.processing_key,
                Direction::Right,
                Direction::Left,
                seconds,
            )
            .await
            .map_err(map_redis_error)?;
        self.return_consumer(conn).await;

        let Some(payload) = moved else {
            return Ok(None);
        };

        match deserialize_envelope(&payload) {
            Ok(envelope) => {
                self.receipts
                    .lock()
                    .await
                    .insert((envelope.id, envelope.attempt), payload);
                Ok(Some(envelope))
            }
            Err(err) => {
                tracing::error!(
                    queue = %self.pending_key,
                    error = %err,
                    "Unreadable job payload, moving to dead letters"
                );
                self.dead_letter_raw(&payload).await?;
                Ok(None)
            }
        }
    }

    async fn ack(&self, envelope: &JobEnvelope) -> Result<()> {
        let receipt = self
            .receipts
            .lock()
            .await
            .remove(&(envelope.id, envelope.attempt));
        let payload = match receipt {
            Some(payload) => payload,
            None => serialize_envelope(envelope)?,
        };
        let mut conn = self.conn.clone();
        conn.lrem::<_, _, ()>(&self.processing_key, 1, payload)
            .await
            .map_err(map_redis_error)?;
        Ok(())
    }

    async fn recover_in_flight(&self) -> Result<usize> {
        let mut conn = self.conn.clone();
        let mut recovered = 0;

        // Newest first onto the tail, so the oldest job is the next one popped.
        loop {
            let moved: Option<String> = conn
                .lmove(
                    &self.processing_key,
                    &self.pending_key,
                    Direction::Left,
                    Direction::Right,
                )
                .await
                .map_err(map_redis_error)?;
            if moved.is_none() {
                break;
            }
            recovered += 1;
        }

        self.receipts.lock().await.clear();
        if recovered > 0 {
            tracing::info!(queue = %self.pending_key, recovered, "Recovered in-flight jobs");
        }
        Ok(recovered)
    }

    async fn dead_letter(&self, envelope: &JobEnvelope) -> Result<()> {
        let payload = serialize_envelope(envelope)?;
        let mut conn = self.conn.clone();
        conn.lpush::<_, _, ()>(&self.failed_key, payload)
            .await
            .map_err(map_redis_error)?;
        Ok(())
    }

    async fn dead_letters(&self) -> Result<Vec<JobEnvelope>> {
        let mut conn = self.conn.clone();
        let payloads: Vec<String> = conn
            .lrange(&self.failed_key, 0, -1)
            .await
            .map_err(map_redis_error)?;

        let envelopes = payloads
            .iter()
            .filter_map(|payload| match deserialize_envelope(payload) {
                Ok(envelope) => Some(envelope),
                Err(err) => {
                    tracing::warn!(queue = %self.failed_key, error = %err, "Skipping unreadable dead letter");
                    None
                }
            })
            .collect();

        Ok(envelopes)
    }

    async fn pending_count(&self) -> Result<usize> {
        let mut conn = self.conn.clone();
        let (ready, scheduled): (usize, usize) = redis::pipe()
            .llen(&self.pending_key)
            .zcard(&self.scheduled_key)
            .query_async(&mut conn)
            .await
            .map_err(map_redis_error)?;
        Ok(ready + scheduled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskhub_core::queue::Job;

    /// Helper to get Redis URL from environment.
    fn redis_url() -> String {
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string())
    }

    /// Skip test if Redis not available. Each queue gets its own prefix.
    async fn get_test_queue() -> Option<RedisJobQueue> {
        let prefix = format!("test:redis_queue:{}:", Uuid::new_v4());
        RedisJobQueue::new(&redis_url(), &prefix).await.ok()
    }

    async fn cleanup(queue: &RedisJobQueue) {
        let mut conn = queue.conn.clone();
        let _: () = conn
            .del(vec![
                queue.pending_key.clone(),
                queue.processing_key.clone(),
                queue.scheduled_key.clone(),
                queue.failed_key.clone(),
            ])
            .await
            .unwrap();
    }

    async fn processing_len(queue: &RedisJobQueue) -> usize {
        let mut conn = queue.conn.clone();
        conn.llen(&queue.processing_key).await.unwrap()
    }

    fn envelope() -> JobEnvelope {
        JobEnvelope::new(
            Job::TaskAssigned {
                task_id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
            },
            3,
        )
    }

    #[tokio::test]
    async fn test_redis_queue_is_fifo() {
        let Some(queue) = get_test_queue().await else {
            eprintln!("Skipping test: Redis not available");
            return;
        };

        let first = envelope();
        let second = envelope();
        queue.enqueue(&first).await.unwrap();
        queue.enqueue(&second).await.unwrap();
        assert_eq!(queue.pending_count().await.unwrap(), 2);

        let timeout = Duration::from_millis(100);
        assert_eq!(queue.dequeue(timeout).await.unwrap(), Some(first));
        assert_eq!(queue.dequeue(timeout).await.unwrap(), Some(second));

        cleanup(&queue).await;
    }

    #[tokio::test]
    async fn test_redis_dequeue_times_out_when_empty() {
        let Some(queue) = get_test_queue().await else {
            eprintln!("Skipping test: Redis not available");
            return;
        };

        let result = queue.dequeue(Duration::from_millis(100)).await.unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_redis_job_stays_in_processing_until_acked() {
        let Some(queue) = get_test_queue().await else {
            eprintln!("Skipping test: Redis not available");
            return;
        };

        queue.enqueue(&envelope()).await.unwrap();
        let taken = queue
            .dequeue(Duration::from_millis(100))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(processing_len(&queue).await, 1);

        queue.ack(&taken).await.unwrap();

        assert_eq!(processing_len(&queue).await, 0);
        cleanup(&queue).await;
    }

    #[tokio::test]
    async fn test_redis_unacked_job_survives_consumer_loss() {
        let Some(queue) = get_test_queue().await else {
            eprintln!("Skipping test: Redis not available");
            return;
        };

        let job = envelope();
        queue.enqueue(&job).await.unwrap();
        queue.dequeue(Duration::from_millis(100)).await.unwrap();

        // A fresh process sharing the same keys picks the job back up.
        let restarted = RedisJobQueue::from_parts(
            queue.client.clone(),
            queue.conn.clone(),
            queue.pending_key.trim_end_matches("jobs:notifications"),
        );
        assert_eq!(restarted.recover_in_flight().await.unwrap(), 1);

        assert_eq!(processing_len(&queue).await, 0);
        assert_eq!(
            restarted.dequeue(Duration::from_millis(100)).await.unwrap(),
            Some(job)
        );
        cleanup(&queue).await;
    }

    #[tokio::test]
    async fn test_redis_scheduled_job_is_promoted_when_due() {
        let Some(queue) = get_test_queue().await else {
            eprintln!("Skipping test: Redis not available");
            return;
        };

        let retry = envelope().next_attempt("boom");
        queue
            .schedule(&retry, Duration::from_millis(200))
            .await
            .unwrap();
        assert_eq!(queue.pending_count().await.unwrap(), 1);

        assert!(queue
            .dequeue(Duration::from_millis(50))
            .await
            .unwrap()
            .is_none());
        tokio::time::sleep(Duration::from_millis(250)).await;

        assert_eq!(
            queue.dequeue(Duration::from_millis(100)).await.unwrap(),
            Some(retry)
        );
        cleanup(&queue).await;
    }

    #[tokio::test]
    async fn test_redis_unreadable_payload_is_dead_lettered() {
        let Some(queue) = get_test_queue().await else {
            eprintln!("Skipping test: Redis not available");
            return;
        };

        let mut conn = queue.conn.clone();
        let _: () = conn.lpush(&queue.pending_key, "not json").await.unwrap();

        let result = queue.dequeue(Duration::from_millis(100)).await.unwrap();

        assert!(result.is_none());
        assert_eq!(processing_len(&queue).await, 0);
        let failed: Vec<String> = conn.lrange(&queue.failed_key, 0, -1).await.unwrap();
        assert_eq!(failed, vec!["not json".to_string()]);
        cleanup(&queue).await;
    }

    #[tokio::test]
    async fn test_redis_dead_letters() {
        let Some(queue) = get_test_queue().await else {
            eprintln!("Skipping test: Redis not available");
            return;
        };

        let job = envelope().failed("boom");
        queue.dead_letter(&job).await.unwrap();

        assert_eq!(queue.dead_letters().await.unwrap(), vec![job]);
        assert_eq!(queue.pending_count().await.unwrap(), 0);

        cleanup(&queue).await;
    }
}
