//! Cache backend implementations.
//!
//! This module provides concrete implementations of the `Cache` trait
//! defined in `taskhub_core::cache`. The backend is chosen at startup
//! from `CACHE_BACKEND`; both satisfy the same contract.
//!
//! # Feature Flags
//!
//! - `redis` (default): compiles the Redis backend. Without it only the
//!   in-memory backend is available.

pub mod memory;

#[cfg(feature = "redis")]
pub mod redis_impl;

pub use memory::MemoryCache;

#[cfg(feature = "redis")]
pub use redis_impl::RedisCache;
