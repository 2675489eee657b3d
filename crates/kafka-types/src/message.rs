//! Kafka message records.

use crate::value::Value;

/// A record exactly as the broker delivered it.
///
/// Sources produce these; the consumer turns them into [`Record`]s by
/// running the configured key and value deserializers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// Kafka topic name
    pub topic: String,
    /// Kafka partition number
    pub partition: i32,
    /// Kafka offset within the partition
    pub offset: i64,
    /// Message key bytes (if any)
    pub key: Option<Vec<u8>>,
    /// Message payload bytes (`None` for tombstones)
    pub payload: Option<Vec<u8>>,
    /// Message timestamp in milliseconds since epoch (if available)
    pub timestamp: Option<i64>,
}

impl RawRecord {
    /// Build a record with a payload and no key or timestamp.
    pub fn new(
        topic: impl Into<String>,
        partition: i32,
        offset: i64,
        payload: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            topic: topic.into(),
            partition,
            offset,
            key: None,
            payload: Some(payload.into()),
            timestamp: None,
        }
    }

    pub fn with_key(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// A decoded Kafka message with metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Kafka topic name
    pub topic: String,
    /// Kafka partition number
    pub partition: i32,
    /// Kafka offset within the partition
    pub offset: i64,
    /// Decoded message key (if any)
    pub key: Option<Value>,
    /// Decoded message payload
    pub value: Value,
    /// Message timestamp in milliseconds since epoch (if available)
    pub timestamp: Option<i64>,
}

impl Record {
    /// Offset to commit once this record has been handled.
    pub fn next_offset(&self) -> i64 {
        self.offset + 1
    }
}
