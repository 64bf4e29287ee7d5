use redis::{ErrorKind, RedisError};

use taskhub_core::queue::QueueError;

/// Maps a Redis error onto `QueueError`.
///
/// A `BLMOVE` that times out is not an error (it yields `None`), so a timeout
/// seen here means the connection itself stalled.
pub fn map_redis_error(err: RedisError) -> QueueError {
    match err.kind() {
        ErrorKind::IoError => QueueError::ConnectionFailed(err.to_string()),
        ErrorKind::TypeError => QueueError::Serialization(err.to_string()),
        _ if err.is_connection_refusal() || err.is_timeout() || err.is_connection_dropped() => {
            QueueError::ConnectionFailed(err.to_string())
        }
        _ => QueueError::OperationFailed(err.to_string()),
    }
}
