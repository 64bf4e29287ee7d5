use std::{env, fmt, str::FromStr, time::Duration};

use taskhub_core::queue::RetryPolicy;
use thiserror::Error;

/// Errors raised while reading configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value:?} (expected one of: memory, redis)")]
    InvalidBackend { name: &'static str, value: String },
}

/// Where cache entries or queued jobs live.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Backend {
    /// Process-local, lost on restart.
    #[default]
    Memory,
    /// Shared through Redis.
    Redis,
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Backend::Memory),
            "redis" => Ok(Backend::Redis),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Memory => write!(f, "memory"),
            Backend::Redis => write!(f, "redis"),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Cache backend (default: memory)
    pub cache_backend: Backend,
    /// Maximum number of in-memory cache entries (default: 10,000)
    pub cache_max_entries: usize,
    /// TTL for cached task data in seconds (default: 600)
    pub task_cache_ttl_seconds: u64,
    /// Job queue backend (default: memory)
    pub queue_backend: Backend,
    /// Redis connection URL (default: "redis://localhost:6379")
    pub redis_url: String,
    /// Prefix for every Redis key (default: "taskhub:")
    pub redis_key_prefix: String,
    /// Number of notification workers (default: 4)
    pub notification_workers: usize,
    /// Attempts per notification job (default: 3)
    pub notification_max_attempts: u32,
    /// First retry delay in milliseconds (default: 1,000)
    pub notification_retry_base_ms: u64,
    /// Retry delay cap in milliseconds (default: 60,000)
    pub notification_retry_max_ms: u64,
    /// How long an idle worker waits for a job before checking for shutdown (default: 1,000)
    pub queue_poll_interval_ms: u64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `CACHE_BACKEND` - `memory` or `redis` (default: memory)
    /// - `CACHE_MAX_ENTRIES` - Maximum in-memory cache entries (default: 10,000)
    /// - `TASK_CACHE_TTL_SECONDS` - TTL for cached task data (default: 600)
    /// - `QUEUE_BACKEND` - `memory` or `redis` (default: memory)
    /// - `REDIS_URL` - Redis connection URL (default: "redis://localhost:6379")
    /// - `REDIS_KEY_PREFIX` - Prefix for Redis keys (default: "taskhub:")
    /// - `NOTIFICATION_WORKERS` - Notification worker count (default: 4)
    /// - `NOTIFICATION_MAX_ATTEMPTS` - Attempts per notification job (default: 3)
    /// - `NOTIFICATION_RETRY_BASE_MS` - First retry delay (default: 1,000)
    /// - `NOTIFICATION_RETRY_MAX_MS` - Retry delay cap (default: 60,000)
    /// - `QUEUE_POLL_INTERVAL_MS` - Idle worker poll interval (default: 1,000)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds configuration from an arbitrary variable lookup.
    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let parse = |name: &str| lookup(name).and_then(|v| v.trim().parse::<u64>().ok());
        let backend = |name: &'static str, default: Backend| match lookup(name) {
            Some(value) => value
                .parse::<Backend>()
                .map_err(|value| ConfigError::InvalidBackend { name, value }),
            None => Ok(default),
        };

        Ok(Self {
            cache_backend: backend("CACHE_BACKEND", defaults.cache_backend)?,
            cache_max_entries: parse("CACHE_MAX_ENTRIES")
                .map(|v| v as usize)
                .filter(|v| *v > 0)
                .unwrap_or(defaults.cache_max_entries),
            task_cache_ttl_seconds: parse("TASK_CACHE_TTL_SECONDS")
                .filter(|v| *v > 0)
                .unwrap_or(defaults.task_cache_ttl_seconds),
            queue_backend: backend("QUEUE_BACKEND", defaults.queue_backend)?,
            redis_url: lookup("REDIS_URL").unwrap_or(defaults.redis_url),
            redis_key_prefix: lookup("REDIS_KEY_PREFIX").unwrap_or(defaults.redis_key_prefix),
            notification_workers: parse("NOTIFICATION_WORKERS")
                .map(|v| v as usize)
                .filter(|v| *v > 0)
                .unwrap_or(defaults.notification_workers),
            notification_max_attempts: parse("NOTIFICATION_MAX_ATTEMPTS")
                .and_then(|v| u32::try_from(v).ok())
                .filter(|v| *v > 0)
                .unwrap_or(defaults.notification_max_attempts),
            notification_retry_base_ms: parse("NOTIFICATION_RETRY_BASE_MS")
                .unwrap_or(defaults.notification_retry_base_ms),
            notification_retry_max_ms: parse("NOTIFICATION_RETRY_MAX_MS")
                .unwrap_or(defaults.notification_retry_max_ms),
            queue_poll_interval_ms: parse("QUEUE_POLL_INTERVAL_MS")
                .filter(|v| *v > 0)
                .unwrap_or(defaults.queue_poll_interval_ms),
        })
    }

    /// Get the task cache TTL as a Duration.
    pub fn task_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.task_cache_ttl_seconds)
    }

    /// Get the idle worker poll interval as a Duration.
    pub fn queue_poll_interval(&self) -> Duration {
        Duration::from_millis(self.queue_poll_interval_ms)
    }

    /// Retry policy for notification jobs.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.notification_max_attempts,
            Duration::from_millis(self.notification_retry_base_ms),
            Duration::from_millis(self.notification_retry_max_ms),
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_backend: Backend::Memory,
            cache_max_entries: 10_000,
            task_cache_ttl_seconds: 600,
            queue_backend: Backend::Memory,
            redis_url: "redis://localhost:6379".to_string(),
            redis_key_prefix: "taskhub:".to_string(),
            notification_workers: 4,
            notification_max_attempts: 3,
            notification_retry_base_ms: 1_000,
            notification_retry_max_ms: 60_000,
            queue_poll_interval_ms: 1_000,
        }
    }
}
