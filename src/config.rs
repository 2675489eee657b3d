//! Settings resolution: YAML config file, then command-line flags on top.

pub mod duration;

use crate::ConsumeOpts;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use topic_tail_kafka::{
    ConsumerConfig, Deserializer, JsonDeserializer, OffsetReset, ProtobufDeserializer,
    Utf8Deserializer,
};
use tracing::debug;

/// How message keys or payloads are decoded before printing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PayloadFormat {
    /// Leave the bytes as they are
    #[default]
    Raw,
    /// UTF-8 text
    Utf8,
    /// JSON documents
    Json,
    /// Protobuf messages described by --proto-path
    Protobuf,
}

/// Contents of a `--config` YAML file.
///
/// Every key is optional; flags given on the command line win.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub topics: Vec<String>,
    pub pattern: Option<String>,
    pub bootstrap_servers: Vec<String>,
    pub group_id: Option<String>,
    pub client_id: Option<String>,
    pub auto_offset_reset: Option<OffsetReset>,
    pub enable_auto_commit: Option<bool>,
    pub auto_commit_interval_ms: Option<u64>,
    pub session_timeout_ms: Option<u64>,
    pub consumer_timeout: Option<String>,
    pub key_format: Option<PayloadFormat>,
    pub value_format: Option<PayloadFormat>,
    pub proto_path: Option<PathBuf>,
    pub message_type: Option<String>,
    pub key_message_type: Option<String>,
    pub num_consumers: Option<usize>,
    pub max_messages: Option<u64>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path:?}"))?;
        Self::from_yaml(&content).with_context(|| format!("Failed to parse config file: {path:?}"))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }
}

/// Everything needed to run a consume session.
#[derive(Debug, Clone)]
pub struct Settings {
    pub topics: Vec<String>,
    pub pattern: Option<String>,
    pub consumer: ConsumerConfig,
    pub num_consumers: usize,
    pub max_messages: Option<u64>,
}

impl Settings {
    /// Merge command-line options over an optional config file.
    pub fn resolve(opts: &ConsumeOpts, file: Option<FileConfig>) -> Result<Self> {
        let file = file.unwrap_or_default();

        let topics = if opts.topics.is_empty() {
            file.topics
        } else {
            opts.topics.clone()
        };
        let pattern = opts.pattern.clone().or(file.pattern);
        match (&pattern, topics.is_empty()) {
            (Some(_), false) => anyhow::bail!("Use either topic names or --pattern, not both"),
            (None, true) => anyhow::bail!("No topics to consume: pass topic names or --pattern"),
            _ => {}
        }

        let mut consumer = ConsumerConfig::default();
        let bootstrap_servers = if opts.bootstrap_servers.is_empty() {
            file.bootstrap_servers
        } else {
            opts.bootstrap_servers.clone()
        };
        if !bootstrap_servers.is_empty() {
            consumer.bootstrap_servers = bootstrap_servers;
        }
        consumer.group_id = opts.group_id.clone().or(file.group_id);
        if let Some(client_id) = opts.client_id.clone().or(file.client_id) {
            consumer.client_id = client_id;
        }
        if let Some(reset) = opts.auto_offset_reset.or(file.auto_offset_reset) {
            consumer.auto_offset_reset = reset;
        }
        consumer.enable_auto_commit = if opts.no_auto_commit {
            false
        } else {
            file.enable_auto_commit.unwrap_or(consumer.enable_auto_commit)
        };
        if let Some(ms) = opts.auto_commit_interval_ms.or(file.auto_commit_interval_ms) {
            consumer.auto_commit_interval_ms = ms;
        }
        if let Some(ms) = opts.session_timeout_ms.or(file.session_timeout_ms) {
            consumer.session_timeout_ms = ms;
        }
        if let Some(timeout) = opts.consumer_timeout.as_ref().or(file.consumer_timeout.as_ref()) {
            consumer.consumer_timeout = Some(
                duration::parse_duration(timeout)
                    .with_context(|| format!("Invalid consumer timeout: {timeout}"))?,
            );
        }

        let proto_path = opts.proto_path.clone().or(file.proto_path);
        let value_format = opts.value_format.or(file.value_format).unwrap_or_default();
        let key_format = opts.key_format.or(file.key_format).unwrap_or_default();
        let message_type = opts.message_type.clone().or(file.message_type);
        let key_message_type = opts.key_message_type.clone().or(file.key_message_type);

        consumer.value_deserializer =
            build_deserializer(value_format, proto_path.as_deref(), message_type.as_deref())
                .context("Failed to set up value deserializer")?;
        consumer.key_deserializer = build_deserializer(
            key_format,
            proto_path.as_deref(),
            key_message_type.as_deref(),
        )
        .context("Failed to set up key deserializer")?;

        if !consumer.enable_auto_commit && consumer.group_id.is_none() {
            anyhow::bail!("Manual offset commits need a consumer group: pass --group-id");
        }
        consumer.validate()?;

        let num_consumers = opts.num_consumers.or(file.num_consumers).unwrap_or(1);
        if num_consumers == 0 {
            anyhow::bail!("--num-consumers must be at least 1");
        }

        let settings = Self {
            topics,
            pattern,
            consumer,
            num_consumers,
            max_messages: opts.max_messages.or(file.max_messages),
        };
        debug!("Resolved settings: {settings:?}");
        Ok(settings)
    }
}

/// `None` for [`PayloadFormat::Raw`]: the consumer keeps raw bytes on its own.
pub fn build_deserializer(
    format: PayloadFormat,
    proto_path: Option<&Path>,
    message_type: Option<&str>,
) -> Result<Option<Arc<dyn Deserializer>>> {
    let deserializer: Arc<dyn Deserializer> = match format {
        PayloadFormat::Raw => return Ok(None),
        PayloadFormat::Utf8 => Arc::new(Utf8Deserializer),
        PayloadFormat::Json => Arc::new(JsonDeserializer),
        PayloadFormat::Protobuf => {
            let proto_path =
                proto_path.context("--proto-path is required for the protobuf format")?;
            let message_type =
                message_type.context("A message type is required for the protobuf format")?;
            Arc::new(ProtobufDeserializer::from_proto_file(proto_path, message_type)?)
        }
    };
    Ok(Some(deserializer))
}
