//! Pure domain types and traits for taskhub.
//!
//! Nothing in this crate performs I/O. Backends live in the `taskhub` binary.

pub mod cache;
pub mod queue;
pub mod serde;
pub mod storage;
pub mod task;
