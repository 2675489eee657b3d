//! Kafka consumer library behind `topic-tail`.
//!
//! Features:
//!
//! - Topic and pattern subscriptions
//! - Pluggable key/value deserializers (raw, UTF-8, JSON, runtime protobuf, closures)
//! - Idle timeout that ends iteration instead of blocking forever
//! - Auto-commit or manual offset commits after each handled record
//! - Consumer groups: spawn multiple consumers in the same group
//!
//! Broker protocol work is left to librdkafka through the `rdkafka` crate.
//!
//! ```rust,no_run
//! use topic_tail_kafka::{Client, ConsumerConfig, RecordPrinter};
//!
//! # async fn run() -> topic_tail_kafka::Result<()> {
//! let config = ConsumerConfig::default().with_group_id("my-group");
//! let client = Client::new(["my-topic"], config)?;
//! let mut consumer = client.create_consumer()?;
//! RecordPrinter::new(std::io::stdout()).print_consumer(&mut consumer, None).await?;
//! # Ok(())
//! # }
//! ```

/// Consumer construction and consumer groups
pub mod client;
pub mod config;

/// Subscribed consumer iterating over decoded records
pub mod consumer;
pub mod deserializer;
pub mod error;
pub mod kafka_source;
pub mod printer;
pub mod proto;
pub mod source;
pub mod testing;

pub use client::Client;
pub use config::{ConsumerConfig, OffsetReset, Subscription};
pub use consumer::Consumer;
pub use deserializer::{
    Deserializer, FnDeserializer, JsonDeserializer, ProtobufDeserializer, RawDeserializer,
    Utf8Deserializer,
};
pub use error::{Error, Result};
pub use kafka_source::{KafkaSource, KafkaSourceFactory};
pub use printer::RecordPrinter;
pub use proto::decoder::ProtoDecoder;
pub use source::{PartitionOffset, RecordSource, SourceFactory};

pub use kafka_types::{
    KafkaTypesError, ProtoFieldValue, ProtoMessage, ProtoSchema, RawRecord, Record, Value,
};
