//! topic-tail library
//!
//! Consumes Kafka topics and prints one line per record:
//!
//! ```text
//! {topic}:{partition}:{offset}: key={key} value={value}
//! ```
//!
//! # Features
//!
//! - Default consumption with background offset commits
//! - Manual offset control: start from the earliest offset, commit after printing
//! - Payload decoding: raw bytes, UTF-8, JSON or runtime protobuf schemas
//! - Pattern subscriptions (`--pattern '^awesome.*'`)
//! - Idle timeout that ends consumption when a topic goes quiet
//! - Several consumers in one consumer group
//!
//! # CLI Usage
//!
//! ```bash
//! # Tail a topic, committing offsets in the background
//! topic-tail consume my-topic --group-id my-group --bootstrap-servers localhost:9092
//!
//! # Read from the beginning and commit manually, stop after 10s of silence
//! topic-tail consume my-topic --group-id my-group --auto-offset-reset earliest \
//!   --no-auto-commit --consumer-timeout 10s
//!
//! # Decode JSON payloads from every topic matching a pattern
//! topic-tail consume --pattern '^awesome.*' --value-format json
//!
//! # Run one of the canned examples
//! topic-tail demo manual-commit
//! ```

use clap::Parser;
use std::path::PathBuf;
use topic_tail_kafka::OffsetReset;

pub mod config;
pub mod demo;
pub mod run;

pub use config::{FileConfig, PayloadFormat, Settings};

#[derive(Parser, Clone, Debug, Default)]
pub struct ConsumeOpts {
    /// Topics to consume
    #[arg(value_name = "TOPIC")]
    pub topics: Vec<String>,

    /// Subscribe to every topic matching this regular expression instead
    #[arg(long)]
    pub pattern: Option<String>,

    /// Kafka bootstrap servers (comma-separated or multiple flags)
    #[arg(long, value_delimiter = ',', env = "KAFKA_BOOTSTRAP_SERVERS")]
    pub bootstrap_servers: Vec<String>,

    /// Consumer group ID
    #[arg(long, env = "KAFKA_GROUP_ID")]
    pub group_id: Option<String>,

    /// Client ID reported to the brokers
    #[arg(long)]
    pub client_id: Option<String>,

    /// Where to start when the group has no committed offset (default: latest)
    #[arg(long, value_enum)]
    pub auto_offset_reset: Option<OffsetReset>,

    /// Disable background offset commits; offsets are committed after each printed record
    #[arg(long)]
    pub no_auto_commit: bool,

    /// Background commit interval in milliseconds (default: 5000)
    #[arg(long)]
    pub auto_commit_interval_ms: Option<u64>,

    /// Session timeout in milliseconds (default: 10000)
    #[arg(long)]
    pub session_timeout_ms: Option<u64>,

    /// Stop after this long without a record, e.g. "500ms", "10s", "5m"
    /// (default: wait forever)
    #[arg(long)]
    pub consumer_timeout: Option<String>,

    /// How to decode message keys (default: raw)
    #[arg(long, value_enum)]
    pub key_format: Option<PayloadFormat>,

    /// How to decode message payloads (default: raw)
    #[arg(long, value_enum)]
    pub value_format: Option<PayloadFormat>,

    /// .proto file for the protobuf formats
    #[arg(long, value_name = "PATH")]
    pub proto_path: Option<PathBuf>,

    /// Protobuf message type of payloads
    #[arg(long)]
    pub message_type: Option<String>,

    /// Protobuf message type of keys
    #[arg(long)]
    pub key_message_type: Option<String>,

    /// Number of consumers to run in the consumer group (default: 1)
    #[arg(long)]
    pub num_consumers: Option<usize>,

    /// Stop after printing this many records
    #[arg(long)]
    pub max_messages: Option<u64>,

    /// YAML file with default values for any of these options
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl ConsumeOpts {
    /// Resolve these options against the config file they point to, if any.
    pub fn into_settings(self) -> anyhow::Result<Settings> {
        let file = match &self.config {
            Some(path) => Some(FileConfig::from_file(path)?),
            None => None,
        };
        Settings::resolve(&self, file)
    }
}
