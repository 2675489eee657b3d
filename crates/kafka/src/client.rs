use crate::config::{ConsumerConfig, Subscription};
use crate::consumer::Consumer;
use crate::error::Result;
use crate::kafka_source::KafkaSourceFactory;
use crate::source::SourceFactory;
use kafka_types::Record;
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Kafka client for creating consumers
///
/// Holds the topics and configuration given at construction and builds
/// consumers from them, one or many in the same consumer group.
pub struct Client {
    subscription: Option<Subscription>,
    config: ConsumerConfig,
    factory: Arc<dyn SourceFactory>,
}

impl Client {
    /// Create a client subscribing to `topics` through librdkafka.
    ///
    /// With no topics, consumers start unsubscribed; use
    /// [`Client::with_pattern`] or [`Consumer::subscribe_pattern`].
    pub fn new<I, S>(topics: I, config: ConsumerConfig) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_factory(topics, config, Arc::new(KafkaSourceFactory))
    }

    /// Same as [`Client::new`] with a custom record source factory.
    pub fn with_factory<I, S>(
        topics: I,
        config: ConsumerConfig,
        factory: Arc<dyn SourceFactory>,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        config.validate()?;
        let topics: Vec<String> = topics.into_iter().map(Into::into).collect();
        let subscription = if topics.is_empty() {
            None
        } else {
            Some(Subscription::topics(topics)?)
        };
        Ok(Self {
            subscription,
            config,
            factory,
        })
    }

    /// Subscribe future consumers to a topic-name pattern instead.
    pub fn with_pattern(mut self, pattern: &str) -> Result<Self> {
        self.subscription = Some(Subscription::pattern(pattern)?);
        Ok(self)
    }

    /// Create a single consumer, subscribed when the client has a subscription
    pub fn create_consumer(&self) -> Result<Consumer> {
        let source = self.factory.create(&self.config)?;
        let mut consumer = Consumer::new(source, self.config.clone());
        if let Some(subscription) = &self.subscription {
            consumer.subscribe(subscription.clone())?;
        }
        Ok(consumer)
    }

    /// Spawn a consumer task that hands every record to `processor`
    ///
    /// With manual commits configured, a record's offset is committed right
    /// after `processor` succeeds for it. The task ends with the number of
    /// processed records when the consumer's iteration ends, or with the
    /// first error.
    pub fn spawn_consumer_task<F, Fut>(&self, processor: F) -> Result<JoinHandle<Result<u64>>>
    where
        F: Fn(Record) -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let mut consumer = self.create_consumer()?;
        let manual_commit = self.config.manual_commit();

        let handle = tokio::spawn(async move {
            let mut processed = 0u64;
            while let Some(record) = consumer.next().await? {
                let position = manual_commit.then(|| record.clone());
                let processed_record = processor(record);
                processed_record.await?;
                if let Some(position) = position {
                    consumer.commit(&position).await?;
                }
                processed += 1;
            }
            debug!("Consumer task finished after {processed} records");
            Ok(processed)
        });

        Ok(handle)
    }

    /// Spawn multiple consumer tasks in the same consumer group
    ///
    /// When spawning multiple consumers:
    /// - All consumers join the same consumer group (same `group_id`)
    /// - The broker assigns different partitions to each consumer
    /// - Nothing is shared between the tasks except `processor`
    pub fn spawn_consumer_group<F, Fut>(
        &self,
        num_consumers: usize,
        processor: F,
    ) -> Result<Vec<JoinHandle<Result<u64>>>>
    where
        F: Fn(Record) -> Fut + Send + Clone + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        if self.config.group_id.is_none() && num_consumers > 1 {
            warn!("Consumers without a group id do not share partitions; each sees every record");
        }
        info!("Spawning {num_consumers} consumers");

        let mut handles = Vec::with_capacity(num_consumers);
        for _ in 0..num_consumers {
            handles.push(self.spawn_consumer_task(processor.clone())?);
        }
        Ok(handles)
    }

    pub fn subscription(&self) -> Option<&Subscription> {
        self.subscription.as_ref()
    }

    pub fn config(&self) -> &ConsumerConfig {
        &self.config
    }
}
