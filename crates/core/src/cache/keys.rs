use std::time::Duration;

use uuid::Uuid;

/// Cache key holding every non-deleted task.
pub const ALL_TASKS_KEY: &str = "tasks_all";

/// TTL applied to cached task data.
pub const TASK_CACHE_TTL: Duration = Duration::from_secs(10 * 60);

/// Returns the cache key for a single task.
pub fn task_key(task_id: Uuid) -> String {
    format!("task_{}", task_id)
}

/// Returns the cache key for tasks a user created or is assigned to.
pub fn user_tasks_key(user_id: Uuid) -> String {
    format!("user_tasks_{}", user_id)
}

/// Returns the cache key for open tasks assigned to a user.
pub fn pending_tasks_key(user_id: Uuid) -> String {
    format!("pending_tasks_{}", user_id)
}

/// Returns every per-user cache key for a user.
pub fn user_cache_keys(user_id: Uuid) -> [String; 2] {
    [user_tasks_key(user_id), pending_tasks_key(user_id)]
}
