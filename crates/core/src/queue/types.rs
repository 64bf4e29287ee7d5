use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::QueueError;

/// Attempts a job gets before it is dead-lettered.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Deferred work handled by the notification workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Job {
    /// Persist a "task assigned" notification for `user_id`.
    TaskAssigned { task_id: Uuid, user_id: Uuid },
}

/// A job plus its delivery bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobEnvelope {
    pub id: Uuid,
    pub job: Job,
    /// 1-based number of the attempt this envelope represents.
    pub attempt: u32,
    pub max_attempts: u32,
    pub enqueued_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl JobEnvelope {
    /// Wraps a job for its first attempt.
    pub fn new(job: Job, max_attempts: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            job,
            attempt: 1,
            max_attempts: max_attempts.max(1),
            enqueued_at: Utc::now(),
            last_error: None,
        }
    }

    /// Returns true if another attempt is allowed after this one fails.
    pub fn can_retry(&self) -> bool {
        self.attempt < self.max_attempts
    }

    /// Returns the envelope for the next attempt, remembering why this one failed.
    pub fn next_attempt(&self, error: impl Into<String>) -> Self {
        Self {
            attempt: self.attempt + 1,
            last_error: Some(error.into()),
            ..self.clone()
        }
    }

    /// Returns this envelope marked with its final failure.
    pub fn failed(&self, error: impl Into<String>) -> Self {
        Self {
            last_error: Some(error.into()),
            ..self.clone()
        }
    }
}

/// Exponential backoff between attempts of the same job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy; at least one attempt is always made.
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay: max_delay.max(base_delay),
        }
    }

    /// Delay before retrying after attempt number `attempt` failed.
    ///
    /// Doubles from `base_delay` on each attempt, capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_ATTEMPTS,
            Duration::from_secs(1),
            Duration::from_secs(60),
        )
    }
}

/// Serializes an envelope to the JSON form stored by queue backends.
pub fn serialize_envelope(envelope: &JobEnvelope) -> Result<String, QueueError> {
    serde_json::to_string(envelope).map_err(|e| QueueError::Serialization(e.to_string()))
}

/// Deserializes an envelope from its stored JSON form.
pub fn deserialize_envelope(payload: &str) -> Result<JobEnvelope, QueueError> {
    serde_json::from_str(payload).map_err(|e| QueueError::Serialization(e.to_string()))
}
