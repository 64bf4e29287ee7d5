//! Task lifecycle and notification read services.
//!
//! The services own the cache-aside reads, the invalidation that follows every
//! task mutation, and the hand-off of assignment notifications to the job
//! queue. HTTP handlers are thin wrappers around them.

mod error;
mod notifications;
mod tasks;

pub use error::{service_error_to_status_code, Result, ServiceError};
pub use notifications::NotificationService;
pub use tasks::TaskService;
