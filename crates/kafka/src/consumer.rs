use crate::config::{ConsumerConfig, Subscription};
use crate::error::{Error, Result};
use crate::source::{PartitionOffset, RecordSource};
use futures::Stream;
use kafka_types::{RawRecord, Record, Value};
use std::collections::HashMap;
use tracing::{debug, trace};

/// A subscribed consumer yielding decoded records one at a time.
///
/// Iteration ends (`Ok(None)`) when the configured idle timeout elapses
/// without a record or when the source itself ends. Any failure from the
/// source or a deserializer is returned unchanged.
pub struct Consumer {
    source: Box<dyn RecordSource>,
    config: ConsumerConfig,
    subscription: Option<Subscription>,
}

impl Consumer {
    /// Wrap a source. Nothing is consumed until a subscription is set.
    pub fn new(source: Box<dyn RecordSource>, config: ConsumerConfig) -> Self {
        Self {
            source,
            config,
            subscription: None,
        }
    }

    /// Replace the current subscription.
    pub fn subscribe(&mut self, subscription: Subscription) -> Result<()> {
        self.source.subscribe(&subscription)?;
        self.subscription = Some(subscription);
        Ok(())
    }

    /// Subscribe to every topic whose name matches `pattern`.
    pub fn subscribe_pattern(&mut self, pattern: &str) -> Result<()> {
        self.subscribe(Subscription::pattern(pattern)?)
    }

    pub fn subscription(&self) -> Option<&Subscription> {
        self.subscription.as_ref()
    }

    pub fn config(&self) -> &ConsumerConfig {
        &self.config
    }

    /// Wait for the next record.
    pub async fn next(&mut self) -> Result<Option<Record>> {
        if self.subscription.is_none() {
            return Err(Error::NotSubscribed);
        }

        let raw = match self.config.consumer_timeout {
            Some(idle) => match tokio::time::timeout(idle, self.source.poll()).await {
                Ok(polled) => polled?,
                Err(_) => {
                    debug!("No record within {idle:?}, ending iteration");
                    return Ok(None);
                }
            },
            None => self.source.poll().await?,
        };

        match raw {
            Some(raw) => self.decode(raw).map(Some),
            None => {
                debug!("Record source ended");
                Ok(None)
            }
        }
    }

    fn decode(&self, raw: RawRecord) -> Result<Record> {
        trace!(
            "Decoding record {}:{}:{}",
            raw.topic,
            raw.partition,
            raw.offset
        );

        let key = match (raw.key, &self.config.key_deserializer) {
            (Some(bytes), Some(d)) => Some(d.deserialize(&raw.topic, &bytes)?),
            (Some(bytes), None) => Some(Value::Bytes(bytes)),
            (None, _) => None,
        };
        let value = match (raw.payload, &self.config.value_deserializer) {
            (Some(bytes), Some(d)) => d.deserialize(&raw.topic, &bytes)?,
            (Some(bytes), None) => Value::Bytes(bytes),
            (None, _) => Value::Null,
        };

        Ok(Record {
            topic: raw.topic,
            partition: raw.partition,
            offset: raw.offset,
            key,
            value,
            timestamp: raw.timestamp,
        })
    }

    /// Commit the position after `record`.
    pub async fn commit(&mut self, record: &Record) -> Result<()> {
        self.commit_batch(std::slice::from_ref(record)).await
    }

    /// Commit the position after the highest offset seen per partition.
    pub async fn commit_batch(&mut self, records: &[Record]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        if self.config.group_id.is_none() {
            return Err(Error::InvalidConfig(
                "offsets can only be committed with a group id".to_string(),
            ));
        }

        let mut latest: HashMap<(&str, i32), i64> = HashMap::new();
        for record in records {
            let entry = latest
                .entry((record.topic.as_str(), record.partition))
                .or_insert(record.next_offset());
            *entry = (*entry).max(record.next_offset());
        }

        let mut offsets: Vec<PartitionOffset> = latest
            .into_iter()
            .map(|((topic, partition), offset)| PartitionOffset {
                topic: topic.to_string(),
                partition,
                offset,
            })
            .collect();
        offsets.sort_by(|a, b| (&a.topic, a.partition).cmp(&(&b.topic, b.partition)));

        self.source.commit(&offsets).await?;
        debug!("Committed {} partition offset(s)", offsets.len());
        Ok(())
    }

    /// Turn the consumer into a stream of records.
    ///
    /// The stream ends where [`Consumer::next`] would return `Ok(None)`, and
    /// right after yielding the first error.
    pub fn into_stream(self) -> impl Stream<Item = Result<Record>> + Send {
        futures::stream::unfold(Some(self), |state| async move {
            let mut consumer = state?;
            match consumer.next().await {
                Ok(Some(record)) => Some((Ok(record), Some(consumer))),
                Ok(None) => None,
                Err(e) => Some((Err(e), None)),
            }
        })
    }
}
