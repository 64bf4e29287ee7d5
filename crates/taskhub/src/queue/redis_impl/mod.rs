//! Redis job queue backend.
//!
//! Jobs survive process restarts and are shared by every worker pool
//! connected to the same Redis instance and key prefix.

mod error;
mod queue;

pub use queue::RedisJobQueue;
