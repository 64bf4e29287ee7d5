use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use super::serialization::{deserialize_value, serialize_value};
use super::Result;

/// TTL applied when a caller does not specify one.
pub const DEFAULT_TTL: Duration = Duration::from_secs(15 * 60);

/// Resolves an optional caller TTL to the effective TTL.
pub fn resolve_ttl(ttl: Option<Duration>) -> Duration {
    ttl.unwrap_or(DEFAULT_TTL)
}

/// Trait for basic cache operations.
///
/// Every backend must behave identically: `ttl = None` means [`DEFAULT_TTL`],
/// expired entries are never returned, and deleting a missing key is a no-op.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Gets a live value from the cache by key.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Sets a value in the cache, overwriting any prior entry.
    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()>;

    /// Deletes a value from the cache by key.
    async fn delete(&self, key: &str) -> Result<()>;
}

/// Typed helpers on top of [`Cache`], available on every backend and on `dyn Cache`.
#[async_trait]
pub trait CacheExt: Cache {
    /// Returns the cached value for `key`, or runs `factory` once and caches its result.
    ///
    /// A failing `factory` caches nothing and its error is returned unchanged.
    /// Cache failures never fail the call: a broken read falls through to
    /// `factory` and a broken write is logged.
    async fn get_or_create<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        factory: F,
    ) -> std::result::Result<T, E>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        E: Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = std::result::Result<T, E>> + Send,
    {
        match self.get(key).await {
            Ok(Some(bytes)) => match deserialize_value::<T>(&bytes) {
                Ok(value) => {
                    tracing::trace!(cache_key = key, "Cache hit");
                    return Ok(value);
                }
                Err(err) => {
                    tracing::warn!(cache_key = key, error = %err, "Cache entry deserialization failed");
                }
            },
            Ok(None) => tracing::trace!(cache_key = key, "Cache miss"),
            Err(err) => {
                tracing::warn!(cache_key = key, error = %err, "Cache read failed, using source");
            }
        }

        let value = factory().await?;

        match serialize_value(&value) {
            Ok(bytes) => {
                if let Err(err) = self.set(key, &bytes, ttl).await {
                    tracing::warn!(cache_key = key, error = %err, "Failed to populate cache");
                }
            }
            Err(err) => {
                tracing::warn!(cache_key = key, error = %err, "Failed to serialize cache value");
            }
        }

        Ok(value)
    }

    /// Non-populating typed lookup.
    async fn get_value<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned + Send,
    {
        match self.get(key).await? {
            Some(bytes) => Ok(Some(deserialize_value(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Unconditional typed write.
    async fn set_value<T>(&self, key: &str, value: &T, ttl: Option<Duration>) -> Result<()>
    where
        T: Serialize + Sync,
    {
        let bytes = serialize_value(value)?;
        self.set(key, &bytes, ttl).await
    }

    /// Unconditional delete; a no-op if the key is absent.
    async fn remove(&self, key: &str) -> Result<()> {
        self.delete(key).await
    }
}

impl<C: Cache + ?Sized> CacheExt for C {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheError;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::Mutex;

    /// Map-backed cache that records TTLs and can be switched into a failing mode.
    #[derive(Default)]
    struct RecordingCache {
        entries: Mutex<HashMap<String, (Vec<u8>, Duration)>>,
        failing: AtomicBool,
    }

    impl RecordingCache {
        fn fail(&self) {
            self.failing.store(true, Ordering::SeqCst);
        }

        fn check(&self) -> Result<()> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(CacheError::ConnectionFailed("down".to_string()));
            }
            Ok(())
        }

        async fn ttl_of(&self, key: &str) -> Option<Duration> {
            self.entries.lock().await.get(key).map(|(_, ttl)| *ttl)
        }
    }

    #[async_trait]
    impl Cache for RecordingCache {
        async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
            self.check()?;
            Ok(self.entries.lock().await.get(key).map(|(v, _)| v.clone()))
        }

        async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()> {
            self.check()?;
            self.entries
                .lock()
                .await
                .insert(key.to_string(), (value.to_vec(), resolve_ttl(ttl)));
            Ok(())
        }

        async fn delete(&self, key: &str) -> Result<()> {
            self.check()?;
            self.entries.lock().await.remove(key);
            Ok(())
        }
    }

    #[derive(Debug, PartialEq)]
    struct SourceError(&'static str);

    #[tokio::test]
    async fn test_get_or_create_invokes_factory_once() {
        let cache = RecordingCache::default();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value: std::result::Result<Vec<u32>, SourceError> = cache
                .get_or_create("numbers", None, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(vec![1, 2, 3])
                })
                .await;
            assert_eq!(value.unwrap(), vec![1, 2, 3]);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_get_or_create_uses_default_ttl() {
        let cache = RecordingCache::default();

        let _: std::result::Result<u32, SourceError> =
            cache.get_or_create("answer", None, || async { Ok(42) }).await;

        assert_eq!(cache.ttl_of("answer").await, Some(DEFAULT_TTL));
    }

    #[tokio::test]
    async fn test_get_or_create_uses_explicit_ttl() {
        let cache = RecordingCache::default();
        let ttl = Duration::from_secs(600);

        let _: std::result::Result<u32, SourceError> = cache
            .get_or_create("answer", Some(ttl), || async { Ok(42) })
            .await;

        assert_eq!(cache.ttl_of("answer").await, Some(ttl));
    }

    #[tokio::test]
    async fn test_get_or_create_factory_error_caches_nothing() {
        let cache = RecordingCache::default();

        let result: std::result::Result<u32, SourceError> = cache
            .get_or_create("broken", None, || async { Err(SourceError("not found")) })
            .await;

        assert_eq!(result, Err(SourceError("not found")));
        assert!(cache.get("broken").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_or_create_falls_through_when_cache_is_down() {
        let cache = RecordingCache::default();
        cache.fail();
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let calls = Arc::clone(&calls);
            let value: std::result::Result<String, SourceError> = cache
                .get_or_create("key", None, || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok("fresh".to_string())
                })
                .await;
            assert_eq!(value.unwrap(), "fresh");
        }

        // Nothing could be cached, so the source is hit every time.
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_get_or_create_treats_undecodable_entry_as_miss() {
        let cache = RecordingCache::default();
        cache.set("key", b"not json", None).await.unwrap();

        let value: std::result::Result<u32, SourceError> =
            cache.get_or_create("key", None, || async { Ok(7) }).await;

        assert_eq!(value.unwrap(), 7);
        assert_eq!(cache.get_value::<u32>("key").await.unwrap(), Some(7));
    }

    #[tokio::test]
    async fn test_get_value_and_set_value() {
        let cache = RecordingCache::default();

        assert_eq!(cache.get_value::<String>("name").await.unwrap(), None);

        cache
            .set_value("name", &"taskhub".to_string(), None)
            .await
            .unwrap();

        assert_eq!(
            cache.get_value::<String>("name").await.unwrap(),
            Some("taskhub".to_string())
        );
    }

    #[tokio::test]
    async fn test_get_value_reports_undecodable_entry() {
        let cache = RecordingCache::default();
        cache.set("key", b"{", None).await.unwrap();

        let err = cache.get_value::<u32>("key").await.unwrap_err();

        assert!(matches!(err, CacheError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_remove_missing_key_is_noop() {
        let cache = RecordingCache::default();

        cache.remove("missing").await.unwrap();
        cache.set_value("present", &1u8, None).await.unwrap();
        cache.remove("present").await.unwrap();

        assert!(cache.get("present").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ext_methods_work_through_trait_object() {
        let cache: Arc<dyn Cache> = Arc::new(RecordingCache::default());

        let value: std::result::Result<u32, SourceError> =
            cache.get_or_create("dyn", None, || async { Ok(5) }).await;

        assert_eq!(value.unwrap(), 5);
        assert_eq!(cache.get_value::<u32>("dyn").await.unwrap(), Some(5));
    }
}
