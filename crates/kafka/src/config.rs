use crate::deserializer::Deserializer;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Where a consumer starts when its group has no committed offset for a partition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OffsetReset {
    /// Start from the oldest retained message
    Earliest,
    /// Start after the newest message; only records produced from now on are seen
    #[default]
    Latest,
}

impl OffsetReset {
    pub fn as_str(&self) -> &'static str {
        match self {
            OffsetReset::Earliest => "earliest",
            OffsetReset::Latest => "latest",
        }
    }
}

impl fmt::Display for OffsetReset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OffsetReset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "earliest" | "smallest" => Ok(OffsetReset::Earliest),
            "latest" | "largest" => Ok(OffsetReset::Latest),
            other => Err(Error::InvalidConfig(format!(
                "auto offset reset must be 'earliest' or 'latest', got '{other}'"
            ))),
        }
    }
}

/// What a consumer is subscribed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subscription {
    /// Explicit topic names
    Topics(Vec<String>),
    /// Topic-name regular expression, re-evaluated by the broker client as topics appear
    Pattern(String),
}

impl Subscription {
    pub fn pattern(pattern: impl Into<String>) -> Result<Self> {
        let pattern = pattern.into();
        if pattern.trim().is_empty() || pattern == "^" {
            return Err(Error::InvalidConfig(
                "topic pattern must not be empty".to_string(),
            ));
        }
        Ok(Subscription::Pattern(pattern))
    }

    pub fn topics<I, S>(topics: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let topics: Vec<String> = topics.into_iter().map(Into::into).collect();
        if topics.is_empty() || topics.iter().any(|t| t.trim().is_empty()) {
            return Err(Error::InvalidConfig(
                "topic names must not be empty".to_string(),
            ));
        }
        Ok(Subscription::Topics(topics))
    }

    /// Topic list in the form librdkafka expects.
    ///
    /// librdkafka treats any topic starting with `^` as a regex, so patterns
    /// are anchored with `^` when the caller did not do it already.
    pub fn to_client_topics(&self) -> Vec<String> {
        match self {
            Subscription::Topics(topics) => topics.clone(),
            Subscription::Pattern(p) if p.starts_with('^') => vec![p.clone()],
            Subscription::Pattern(p) => vec![format!("^{p}")],
        }
    }
}

impl fmt::Display for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subscription::Topics(topics) => write!(f, "topics [{}]", topics.join(", ")),
            Subscription::Pattern(p) => write!(f, "pattern {p}"),
        }
    }
}

/// Configuration for a Kafka consumer
///
/// The values are passed to the broker client as they are. Only the checks in
/// [`ConsumerConfig::validate`] are applied on top.
#[derive(Clone)]
pub struct ConsumerConfig {
    /// Bootstrap broker addresses (`host:port`)
    pub bootstrap_servers: Vec<String>,
    /// Consumer group ID
    ///
    /// Without a group the consumer joins a throwaway group of its own and
    /// never commits offsets.
    pub group_id: Option<String>,
    /// Client identifier reported to the brokers
    pub client_id: String,
    /// Auto offset reset strategy
    pub auto_offset_reset: OffsetReset,
    /// Commit offsets in the background
    ///
    /// When false, the caller commits with [`crate::Consumer::commit`].
    pub enable_auto_commit: bool,
    /// Background commit interval in milliseconds
    pub auto_commit_interval_ms: u64,
    /// Session timeout in milliseconds
    pub session_timeout_ms: u64,
    /// Stop iterating after this long without a record. `None` blocks forever.
    pub consumer_timeout: Option<Duration>,
    /// Decoder for message keys; keys stay raw bytes when unset
    pub key_deserializer: Option<Arc<dyn Deserializer>>,
    /// Decoder for message payloads; payloads stay raw bytes when unset
    pub value_deserializer: Option<Arc<dyn Deserializer>>,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            bootstrap_servers: vec!["localhost:9092".to_string()],
            group_id: None,
            client_id: "topic-tail".to_string(),
            auto_offset_reset: OffsetReset::Latest,
            enable_auto_commit: true,
            auto_commit_interval_ms: 5000,
            session_timeout_ms: 10000,
            consumer_timeout: None,
            key_deserializer: None,
            value_deserializer: None,
        }
    }
}

impl fmt::Debug for ConsumerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsumerConfig")
            .field("bootstrap_servers", &self.bootstrap_servers)
            .field("group_id", &self.group_id)
            .field("client_id", &self.client_id)
            .field("auto_offset_reset", &self.auto_offset_reset)
            .field("enable_auto_commit", &self.enable_auto_commit)
            .field("auto_commit_interval_ms", &self.auto_commit_interval_ms)
            .field("session_timeout_ms", &self.session_timeout_ms)
            .field("consumer_timeout", &self.consumer_timeout)
            .field(
                "key_deserializer",
                &self.key_deserializer.as_ref().map(|d| d.name()),
            )
            .field(
                "value_deserializer",
                &self.value_deserializer.as_ref().map(|d| d.name()),
            )
            .finish()
    }
}

impl ConsumerConfig {
    pub fn with_bootstrap_servers<I, S>(mut self, servers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.bootstrap_servers = servers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_group_id(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    pub fn with_auto_offset_reset(mut self, reset: OffsetReset) -> Self {
        self.auto_offset_reset = reset;
        self
    }

    pub fn with_auto_commit(mut self, enabled: bool) -> Self {
        self.enable_auto_commit = enabled;
        self
    }

    pub fn with_consumer_timeout(mut self, timeout: Duration) -> Self {
        self.consumer_timeout = Some(timeout);
        self
    }

    pub fn with_key_deserializer(mut self, deserializer: impl Deserializer + 'static) -> Self {
        self.key_deserializer = Some(Arc::new(deserializer));
        self
    }

    pub fn with_value_deserializer(mut self, deserializer: impl Deserializer + 'static) -> Self {
        self.value_deserializer = Some(Arc::new(deserializer));
        self
    }

    /// The configured value deserializer, exactly as it was set.
    pub fn value_deserializer(&self) -> Option<&Arc<dyn Deserializer>> {
        self.value_deserializer.as_ref()
    }

    /// The configured key deserializer, exactly as it was set.
    pub fn key_deserializer(&self) -> Option<&Arc<dyn Deserializer>> {
        self.key_deserializer.as_ref()
    }

    /// Whether the caller is expected to commit offsets itself.
    pub fn manual_commit(&self) -> bool {
        !self.enable_auto_commit && self.group_id.is_some()
    }

    pub fn validate(&self) -> Result<()> {
        if self.bootstrap_servers.is_empty()
            || self.bootstrap_servers.iter().any(|s| s.trim().is_empty())
        {
            return Err(Error::InvalidConfig(
                "at least one bootstrap server is required".to_string(),
            ));
        }
        if matches!(&self.group_id, Some(g) if g.trim().is_empty()) {
            return Err(Error::InvalidConfig(
                "group id must not be empty".to_string(),
            ));
        }
        if !self.enable_auto_commit && self.group_id.is_none() {
            return Err(Error::InvalidConfig(
                "manual offset commits require a group id".to_string(),
            ));
        }
        if self.consumer_timeout == Some(Duration::ZERO) {
            return Err(Error::InvalidConfig(
                "consumer timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// librdkafka properties for this configuration.
    pub fn client_properties(&self) -> Vec<(&'static str, String)> {
        let (group_id, auto_commit) = match &self.group_id {
            Some(group) => (group.clone(), self.enable_auto_commit),
            None => (
                format!("{}-{}", self.client_id, uuid::Uuid::new_v4()),
                false,
            ),
        };

        vec![
            ("bootstrap.servers", self.bootstrap_servers.join(",")),
            ("group.id", group_id),
            ("client.id", self.client_id.clone()),
            ("auto.offset.reset", self.auto_offset_reset.to_string()),
            ("enable.auto.commit", auto_commit.to_string()),
            (
                "auto.commit.interval.ms",
                self.auto_commit_interval_ms.to_string(),
            ),
            ("session.timeout.ms", self.session_timeout_ms.to_string()),
            ("enable.partition.eof", "false".to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deserializer::JsonDeserializer;

    fn property<'a>(props: &'a [(&'static str, String)], key: &str) -> &'a str {
        props
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
            .unwrap_or_else(|| panic!("missing property {key}"))
    }

    #[test]
    fn test_defaults_follow_latest_and_auto_commit() {
        let config = ConsumerConfig::default();
        assert_eq!(config.auto_offset_reset, OffsetReset::Latest);
        assert!(config.enable_auto_commit);
        assert!(config.consumer_timeout.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_properties_for_manual_offsets() {
        let config = ConsumerConfig::default()
            .with_bootstrap_servers(["b1:9092", "b2:9092"])
            .with_group_id("my-group")
            .with_auto_offset_reset(OffsetReset::Earliest)
            .with_auto_commit(false);
        let props = config.client_properties();

        assert_eq!(property(&props, "bootstrap.servers"), "b1:9092,b2:9092");
        assert_eq!(property(&props, "group.id"), "my-group");
        assert_eq!(property(&props, "auto.offset.reset"), "earliest");
        assert_eq!(property(&props, "enable.auto.commit"), "false");
        assert!(config.manual_commit());
    }

    #[test]
    fn test_without_group_never_commits() {
        let config = ConsumerConfig::default();
        let props = config.client_properties();

        assert!(property(&props, "group.id").starts_with("topic-tail-"));
        assert_eq!(property(&props, "enable.auto.commit"), "false");
        assert!(!config.manual_commit());
    }

    #[test]
    fn test_validate_rejects_manual_commit_without_group() {
        let config = ConsumerConfig::default().with_auto_commit(false);
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidConfig(msg)) if msg.contains("group id")
        ));
        assert!(config.with_group_id("my-group").validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let no_servers = ConsumerConfig::default().with_bootstrap_servers(Vec::<String>::new());
        assert!(matches!(
            no_servers.validate(),
            Err(Error::InvalidConfig(_))
        ));

        let blank_group = ConsumerConfig::default().with_group_id(" ");
        assert!(blank_group.validate().is_err());

        let zero_timeout = ConsumerConfig::default().with_consumer_timeout(Duration::ZERO);
        assert!(zero_timeout.validate().is_err());
    }

    #[test]
    fn test_offset_reset_parsing() {
        assert_eq!("earliest".parse::<OffsetReset>().unwrap(), OffsetReset::Earliest);
        assert_eq!("LATEST".parse::<OffsetReset>().unwrap(), OffsetReset::Latest);
        assert_eq!("smallest".parse::<OffsetReset>().unwrap(), OffsetReset::Earliest);
        assert!("newest".parse::<OffsetReset>().is_err());
    }

    #[test]
    fn test_pattern_subscription_is_anchored() {
        let sub = Subscription::pattern("awesome.*").unwrap();
        assert_eq!(sub.to_client_topics(), vec!["^awesome.*".to_string()]);

        let anchored = Subscription::pattern("^awesome.*").unwrap();
        assert_eq!(anchored.to_client_topics(), vec!["^awesome.*".to_string()]);

        assert!(Subscription::pattern("").is_err());
        assert!(Subscription::pattern("^").is_err());
        assert!(Subscription::topics(Vec::<String>::new()).is_err());
    }

    #[test]
    fn test_debug_shows_deserializer_names() {
        let config = ConsumerConfig::default().with_value_deserializer(JsonDeserializer);
        let debug = format!("{config:?}");
        assert!(debug.contains("value_deserializer: Some(\"json\")"));
    }
}
