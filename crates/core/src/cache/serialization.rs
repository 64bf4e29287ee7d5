//! Pure functions for serializing/deserializing values to/from cache bytes.
//!
//! These functions use JSON serialization for cache storage, providing human-readable
//! cache values that are easy to debug and inspect, and that both backends store
//! byte-for-byte identically.

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use super::CacheError;

/// Errors that can occur during cache serialization/deserialization.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SerializationError {
    /// Failed to serialize a value to bytes.
    #[error("Failed to serialize: {0}")]
    SerializeFailed(String),
    /// Failed to deserialize bytes to a value.
    #[error("Failed to deserialize: {0}")]
    DeserializeFailed(String),
}

impl From<SerializationError> for CacheError {
    fn from(err: SerializationError) -> Self {
        CacheError::Serialization(err.to_string())
    }
}

/// Result type for serialization operations.
pub type Result<T> = std::result::Result<T, SerializationError>;

/// Serializes any value to JSON bytes.
pub fn serialize_value<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| SerializationError::SerializeFailed(e.to_string()))
}

/// Deserializes JSON bytes to a value.
pub fn deserialize_value<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| SerializationError::DeserializeFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Task, TaskStatus, TaskView, User};
    use chrono::{DateTime, TimeZone, Utc};
    use uuid::Uuid;

    fn fixed_timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 10, 30, 0).unwrap()
    }

    fn test_task_id() -> Uuid {
        Uuid::parse_str("6ba7b810-9dad-11d1-80b4-00c04fd430c8").unwrap()
    }

    #[test]
    fn test_task_views_survive_cache_encoding() {
        let creator = User::new("alice", "alice@example.com");
        let task = Task::new("Write docs", fixed_timestamp(), creator.id)
            .with_id(test_task_id())
            .with_description("User guide")
            .with_status(TaskStatus::InProgress)
            .with_created_at(fixed_timestamp());
        let views = vec![TaskView::from_task(&task, Some(&creator), None)];

        let bytes = serialize_value(&views).expect("serialize should succeed");
        let decoded: Vec<TaskView> = deserialize_value(&bytes).expect("deserialize should succeed");

        assert_eq!(decoded, views);
        assert_eq!(decoded[0].status, TaskStatus::InProgress);
        assert!(decoded[0].assigned_to_username.is_none());
    }

    #[test]
    fn test_serialize_empty_vec() {
        let views: Vec<TaskView> = vec![];

        let bytes = serialize_value(&views).expect("serialize should succeed");

        assert_eq!(bytes, b"[]");
    }

    #[test]
    fn test_deserialize_malformed_bytes() {
        let result = deserialize_value::<TaskView>(b"not valid json");

        let err = result.unwrap_err();
        assert!(matches!(err, SerializationError::DeserializeFailed(_)));
    }

    #[test]
    fn test_deserialize_wrong_shape() {
        let result = deserialize_value::<Vec<TaskView>>(b"{\"invalid\": true}");

        assert!(result.is_err());
    }

    #[test]
    fn test_serialization_error_converts_to_cache_error() {
        let err: CacheError = SerializationError::DeserializeFailed("eof".to_string()).into();

        assert_eq!(
            err,
            CacheError::Serialization("Failed to deserialize: eof".to_string())
        );
    }
}
