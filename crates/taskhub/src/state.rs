//! Application state.
//!
//! Holds the services handed to request handlers and owns the notification
//! worker pool. Cache and queue backends are chosen from [`Config`] when the
//! state is built and injected into the services as trait objects.

use std::sync::Arc;

use tokio::sync::Mutex;

use taskhub_core::cache::Cache;
use taskhub_core::queue::JobQueue;
use taskhub_core::storage::UserRepository;

use crate::cache::MemoryCache;
use crate::config::{Backend, Config};
use crate::jobs::{NotificationDispatcher, NotificationWorker, WorkerPool};
use crate::queue::MemoryJobQueue;
use crate::services::{NotificationService, TaskService};
use crate::storage::InMemoryRepository;

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub tasks: TaskService,
    pub notifications: NotificationService,
    pub users: Arc<dyn UserRepository>,
    /// Task cache, exposed for health reporting.
    pub cache: Arc<dyn Cache>,
    /// Notification queue, exposed for health reporting.
    pub queue: Arc<dyn JobQueue>,
    /// Taken on shutdown.
    workers: Arc<Mutex<Option<WorkerPool>>>,
}

impl AppState {
    /// Builds the state with the backends selected in `config`.
    ///
    /// Must be called inside a tokio runtime: the worker pool starts here.
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let (cache, queue) = backends(config).await?;
        tracing::info!(
            cache_backend = %config.cache_backend,
            queue_backend = %config.queue_backend,
            "Backends initialized"
        );

        // Jobs a previous process dequeued but never finished.
        let recovered = queue.recover_in_flight().await?;
        if recovered > 0 {
            tracing::warn!(recovered, "Requeued unfinished notification jobs");
        }

        Ok(Self::build(InMemoryRepository::new(), cache, queue, config))
    }

    /// Process-local cache and queue regardless of what `config` selects.
    #[cfg(test)]
    pub fn in_memory(config: &Config) -> Self {
        Self::with_cache(config, Arc::new(MemoryCache::new(config.cache_max_entries)))
    }

    /// Process-local queue with the given cache.
    #[cfg(test)]
    pub fn with_cache(config: &Config, cache: Arc<dyn Cache>) -> Self {
        Self::build(
            InMemoryRepository::new(),
            cache,
            Arc::new(MemoryJobQueue::new()),
            config,
        )
    }

    fn build(
        repo: InMemoryRepository,
        cache: Arc<dyn Cache>,
        queue: Arc<dyn JobQueue>,
        config: &Config,
    ) -> Self {
        let repo = Arc::new(repo);
        let policy = config.retry_policy();
        let dispatcher = NotificationDispatcher::new(Arc::clone(&queue), policy.max_attempts);

        let tasks = TaskService::new(repo.clone(), repo.clone(), Arc::clone(&cache), dispatcher)
            .with_ttl(config.task_cache_ttl());
        let notifications = NotificationService::new(repo.clone(), repo.clone());

        let workers = WorkerPool::spawn(
            Arc::clone(&queue),
            NotificationWorker::new(repo.clone(), repo.clone()),
            policy,
            config.notification_workers,
            config.queue_poll_interval(),
        );

        Self {
            tasks,
            notifications,
            users: repo,
            cache,
            queue,
            workers: Arc::new(Mutex::new(Some(workers))),
        }
    }

    /// Stops the worker pool. Later calls do nothing.
    pub async fn shutdown(&self) {
        let pool = self.workers.lock().await.take();
        if let Some(pool) = pool {
            pool.shutdown().await;
        }
    }
}

#[cfg(feature = "redis")]
async fn backends(config: &Config) -> anyhow::Result<(Arc<dyn Cache>, Arc<dyn JobQueue>)> {
    use redis::aio::ConnectionManager;

    use crate::cache::RedisCache;
    use crate::queue::RedisJobQueue;

    let uses_redis =
        config.cache_backend == Backend::Redis || config.queue_backend == Backend::Redis;
    let redis = if uses_redis {
        let client = redis::Client::open(config.redis_url.as_str())?;
        let conn = ConnectionManager::new(client.clone()).await?;
        Some((client, conn))
    } else {
        None
    };

    let cache: Arc<dyn Cache> = match (&config.cache_backend, &redis) {
        (Backend::Redis, Some((_, conn))) => Arc::new(RedisCache::from_connection(
            conn.clone(),
            config.redis_key_prefix.clone(),
        )),
        _ => Arc::new(MemoryCache::new(config.cache_max_entries)),
    };

    let queue: Arc<dyn JobQueue> = match (&config.queue_backend, redis) {
        (Backend::Redis, Some((client, conn))) => Arc::new(RedisJobQueue::from_parts(
            client,
            conn,
            &config.redis_key_prefix,
        )),
        _ => Arc::new(MemoryJobQueue::new()),
    };

    Ok((cache, queue))
}

#[cfg(not(feature = "redis"))]
async fn backends(config: &Config) -> anyhow::Result<(Arc<dyn Cache>, Arc<dyn JobQueue>)> {
    if config.cache_backend == Backend::Redis || config.queue_backend == Backend::Redis {
        anyhow::bail!("Redis backend selected but taskhub was built without the `redis` feature");
    }

    Ok((
        Arc::new(MemoryCache::new(config.cache_max_entries)),
        Arc::new(MemoryJobQueue::new()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_backends_from_default_config() {
        let state = AppState::new(&Config::default()).await.unwrap();

        assert!(state.tasks.get_all().await.unwrap().is_empty());
        assert_eq!(state.queue.pending_count().await.unwrap(), 0);

        state.shutdown().await;
        state.shutdown().await;
    }
}
