mod error;
mod keys;
mod serialization;
mod traits;

pub use error::{CacheError, Result};
pub use keys::{
    pending_tasks_key, task_key, user_cache_keys, user_tasks_key, ALL_TASKS_KEY, TASK_CACHE_TTL,
};
pub use serialization::{deserialize_value, serialize_value, SerializationError};
pub use traits::{resolve_ttl, Cache, CacheExt, DEFAULT_TTL};
