//! Storage backend implementations.
//!
//! Concrete implementations of the repository traits defined in
//! `taskhub_core::storage`.

pub mod inmemory;

pub use inmemory::InMemoryRepository;
