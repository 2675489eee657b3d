use crate::config::{ConsumerConfig, Subscription};
use crate::error::{Error, Result};
use crate::source::{PartitionOffset, RecordSource, SourceFactory};
use async_trait::async_trait;
use kafka_types::RawRecord;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer as RdkafkaConsumer, StreamConsumer};
use rdkafka::message::{BorrowedMessage, Message as RdkafkaMessage};
use rdkafka::{Offset, TopicPartitionList};
use tracing::{debug, info};

/// Record source backed by an rdkafka `StreamConsumer`.
pub struct KafkaSource {
    consumer: StreamConsumer,
}

impl KafkaSource {
    pub fn new(config: &ConsumerConfig) -> Result<Self> {
        config.validate()?;

        let mut client_config = ClientConfig::new();
        for (key, value) in config.client_properties() {
            client_config.set(key, value);
        }
        let consumer: StreamConsumer = client_config
            .create()
            .map_err(|e| Error::Consumer(format!("Failed to create consumer: {e}")))?;

        debug!(
            "Created Kafka consumer for {} (group: {:?})",
            config.bootstrap_servers.join(","),
            config.group_id
        );
        Ok(Self { consumer })
    }

    /// Get the underlying consumer (for advanced use cases)
    pub fn inner(&self) -> &StreamConsumer {
        &self.consumer
    }

    fn to_raw(msg: &BorrowedMessage<'_>) -> RawRecord {
        RawRecord {
            topic: msg.topic().to_string(),
            partition: msg.partition(),
            offset: msg.offset(),
            key: msg.key().map(|k| k.to_vec()),
            payload: msg.payload().map(|p| p.to_vec()),
            timestamp: msg.timestamp().to_millis(),
        }
    }
}

#[async_trait]
impl RecordSource for KafkaSource {
    fn subscribe(&mut self, subscription: &Subscription) -> Result<()> {
        let topics = subscription.to_client_topics();
        let topic_refs: Vec<&str> = topics.iter().map(String::as_str).collect();
        self.consumer
            .subscribe(&topic_refs)
            .map_err(|e| Error::Consumer(format!("Failed to subscribe to {subscription}: {e}")))?;
        info!("Subscribed to {subscription}");
        Ok(())
    }

    async fn poll(&mut self) -> Result<Option<RawRecord>> {
        let msg = self
            .consumer
            .recv()
            .await
            .map_err(|e| Error::Consumer(format!("Error receiving message: {e}")))?;
        Ok(Some(Self::to_raw(&msg)))
    }

    async fn commit(&mut self, offsets: &[PartitionOffset]) -> Result<()> {
        if offsets.is_empty() {
            return Ok(());
        }

        let mut tpl = TopicPartitionList::new();
        for po in offsets {
            tpl.add_partition_offset(&po.topic, po.partition, Offset::Offset(po.offset))
                .map_err(|e| Error::Consumer(format!("Failed to add partition offset: {e}")))?;
        }

        self.consumer
            .commit(&tpl, CommitMode::Sync)
            .map_err(|e| Error::Consumer(format!("Failed to commit offset: {e}")))?;
        Ok(())
    }
}

/// Creates [`KafkaSource`]s; the default factory of [`crate::Client`].
#[derive(Debug, Clone, Copy, Default)]
pub struct KafkaSourceFactory;

impl SourceFactory for KafkaSourceFactory {
    fn create(&self, config: &ConsumerConfig) -> Result<Box<dyn RecordSource>> {
        Ok(Box::new(KafkaSource::new(config)?))
    }
}
