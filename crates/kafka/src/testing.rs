//! In-memory test doubles for the broker client.
//!
//! [`StubSource`] replays a fixed list of records and then behaves as told
//! by [`StubEnd`]. [`StubFactory`] hands out such sources and remembers
//! every configuration it was asked to build one for.

use crate::config::{ConsumerConfig, Subscription};
use crate::error::{Error, Result};
use crate::source::{PartitionOffset, RecordSource, SourceFactory};
use async_trait::async_trait;
use kafka_types::RawRecord;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// What a [`StubSource`] does once its records are used up.
#[derive(Debug, Clone, Default)]
pub enum StubEnd {
    /// Report end of stream
    #[default]
    Exhausted,
    /// Never produce anything again; only an idle timeout ends iteration
    Pending,
    /// Fail every further poll with a consumer error
    Error(String),
}

/// Calls observed by a stub source.
#[derive(Debug, Default)]
pub struct StubState {
    pub subscriptions: Vec<Subscription>,
    pub commits: Vec<Vec<PartitionOffset>>,
    pub polled: usize,
}

pub struct StubSource {
    records: VecDeque<RawRecord>,
    end: StubEnd,
    state: Arc<Mutex<StubState>>,
}

impl StubSource {
    pub fn new(records: Vec<RawRecord>) -> Self {
        Self {
            records: records.into(),
            end: StubEnd::Exhausted,
            state: Arc::new(Mutex::new(StubState::default())),
        }
    }

    pub fn then(mut self, end: StubEnd) -> Self {
        self.end = end;
        self
    }

    /// Shared handle for inspecting calls after the source was boxed.
    pub fn state(&self) -> Arc<Mutex<StubState>> {
        Arc::clone(&self.state)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, StubState>> {
        self.state
            .lock()
            .map_err(|_| Error::Consumer("stub state poisoned".to_string()))
    }
}

#[async_trait]
impl RecordSource for StubSource {
    fn subscribe(&mut self, subscription: &Subscription) -> Result<()> {
        self.lock()?.subscriptions.push(subscription.clone());
        Ok(())
    }

    async fn poll(&mut self) -> Result<Option<RawRecord>> {
        self.lock()?.polled += 1;
        if let Some(record) = self.records.pop_front() {
            return Ok(Some(record));
        }
        match &self.end {
            StubEnd::Exhausted => Ok(None),
            StubEnd::Pending => futures::future::pending().await,
            StubEnd::Error(msg) => Err(Error::Consumer(msg.clone())),
        }
    }

    async fn commit(&mut self, offsets: &[PartitionOffset]) -> Result<()> {
        self.lock()?.commits.push(offsets.to_vec());
        Ok(())
    }
}

/// Factory producing [`StubSource`]s over the same records.
#[derive(Default)]
pub struct StubFactory {
    records: Vec<RawRecord>,
    end: StubEnd,
    configs: Mutex<Vec<ConsumerConfig>>,
    states: Mutex<Vec<Arc<Mutex<StubState>>>>,
}

impl StubFactory {
    pub fn new(records: Vec<RawRecord>) -> Self {
        Self {
            records,
            ..Default::default()
        }
    }

    pub fn then(mut self, end: StubEnd) -> Self {
        self.end = end;
        self
    }

    /// Every configuration passed to [`SourceFactory::create`], in order.
    pub fn configs(&self) -> Vec<ConsumerConfig> {
        self.configs.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Call logs of the sources created so far, in creation order.
    pub fn states(&self) -> Vec<Arc<Mutex<StubState>>> {
        self.states.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl SourceFactory for StubFactory {
    fn create(&self, config: &ConsumerConfig) -> Result<Box<dyn RecordSource>> {
        let source = StubSource::new(self.records.clone()).then(self.end.clone());
        self.configs
            .lock()
            .map_err(|_| Error::Consumer("stub factory poisoned".to_string()))?
            .push(config.clone());
        self.states
            .lock()
            .map_err(|_| Error::Consumer("stub factory poisoned".to_string()))?
            .push(source.state());
        Ok(Box::new(source))
    }
}
