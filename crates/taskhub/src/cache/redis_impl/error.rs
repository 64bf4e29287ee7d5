//! Redis failures as cache errors.

use redis::{ErrorKind, RedisError};

use taskhub_core::cache::CacheError;

/// Maps a Redis error onto the cache error taxonomy.
///
/// Transport problems become `ConnectionFailed`, an unexpected reply type
/// becomes `Serialization`, and everything else is `OperationFailed`.
pub fn map_redis_error(err: RedisError) -> CacheError {
    if err.is_io_error()
        || err.is_connection_refusal()
        || err.is_timeout()
        || err.is_connection_dropped()
    {
        return CacheError::ConnectionFailed(err.to_string());
    }

    match err.kind() {
        ErrorKind::TypeError => CacheError::Serialization(err.to_string()),
        _ => CacheError::OperationFailed(err.to_string()),
    }
}
