//! The seam between the consumer and the broker client.
//!
//! [`crate::Consumer`] never talks to rdkafka directly; it drives a
//! [`RecordSource`] built by a [`SourceFactory`]. Production code uses
//! [`crate::kafka_source::KafkaSourceFactory`], tests use the doubles in
//! [`crate::testing`].

use crate::config::{ConsumerConfig, Subscription};
use crate::error::Result;
use async_trait::async_trait;
use kafka_types::RawRecord;

/// Position to commit for one partition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartitionOffset {
    pub topic: String,
    pub partition: i32,
    /// Offset of the next record to read, i.e. last handled offset + 1
    pub offset: i64,
}

/// A stream of raw records from a broker.
#[async_trait]
pub trait RecordSource: Send {
    /// Replace the current subscription.
    fn subscribe(&mut self, subscription: &Subscription) -> Result<()>;

    /// Wait for the next record. `Ok(None)` means the source has ended.
    async fn poll(&mut self) -> Result<Option<RawRecord>>;

    /// Commit offsets synchronously.
    async fn commit(&mut self, offsets: &[PartitionOffset]) -> Result<()>;
}

/// Builds record sources from a consumer configuration.
pub trait SourceFactory: Send + Sync {
    fn create(&self, config: &ConsumerConfig) -> Result<Box<dyn RecordSource>>;
}
