//! Job queue backend implementations.
//!
//! Concrete implementations of `taskhub_core::queue::JobQueue`, selected at
//! startup from `QUEUE_BACKEND`.

mod memory;

#[cfg(feature = "redis")]
pub mod redis_impl;

pub use memory::MemoryJobQueue;

#[cfg(feature = "redis")]
pub use redis_impl::RedisJobQueue;
