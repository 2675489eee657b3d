//! Canned consumer setups for the four usual ways of reading a topic.

use crate::config::Settings;
use std::time::Duration;
use topic_tail_kafka::{ConsumerConfig, JsonDeserializer, OffsetReset};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum DemoScenario {
    /// `my-topic` in group `my-group`, latest offset, background commits
    Default,
    /// Same topic from the earliest offset, committing after each record
    ManualCommit,
    /// JSON payloads, stop after one second without records
    Json,
    /// Every topic matching `^awesome.*`
    Pattern,
}

pub const DEMO_TOPIC: &str = "my-topic";
pub const DEMO_GROUP: &str = "my-group";
pub const DEMO_PATTERN: &str = "^awesome.*";

impl DemoScenario {
    pub fn settings(self, bootstrap_servers: Vec<String>) -> Settings {
        let base = ConsumerConfig::default()
            .with_bootstrap_servers(bootstrap_servers)
            .with_group_id(DEMO_GROUP);

        let (topics, pattern, consumer) = match self {
            DemoScenario::Default => (vec![DEMO_TOPIC.to_string()], None, base),
            DemoScenario::ManualCommit => (
                vec![DEMO_TOPIC.to_string()],
                None,
                base.with_auto_offset_reset(OffsetReset::Earliest)
                    .with_auto_commit(false),
            ),
            DemoScenario::Json => (
                vec![DEMO_TOPIC.to_string()],
                None,
                base.with_value_deserializer(JsonDeserializer)
                    .with_consumer_timeout(Duration::from_millis(1000)),
            ),
            DemoScenario::Pattern => (Vec::new(), Some(DEMO_PATTERN.to_string()), base),
        };

        Settings {
            topics,
            pattern,
            consumer,
            num_consumers: 1,
            max_messages: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn servers() -> Vec<String> {
        vec!["localhost:9092".to_string()]
    }

    #[test]
    fn test_default_scenario() {
        let s = DemoScenario::Default.settings(servers());
        assert_eq!(s.topics, vec![DEMO_TOPIC.to_string()]);
        assert_eq!(s.consumer.group_id.as_deref(), Some(DEMO_GROUP));
        assert_eq!(s.consumer.auto_offset_reset, OffsetReset::Latest);
        assert!(s.consumer.enable_auto_commit);
    }

    #[test]
    fn test_manual_commit_scenario() {
        let s = DemoScenario::ManualCommit.settings(servers());
        assert_eq!(s.consumer.auto_offset_reset, OffsetReset::Earliest);
        assert!(s.consumer.manual_commit());
    }

    #[test]
    fn test_json_and_pattern_scenarios() {
        let json = DemoScenario::Json.settings(servers());
        assert_eq!(
            json.consumer.value_deserializer().map(|d| d.name().to_string()),
            Some("json".to_string())
        );
        assert_eq!(json.consumer.consumer_timeout, Some(Duration::from_secs(1)));

        let pattern = DemoScenario::Pattern.settings(servers());
        assert!(pattern.topics.is_empty());
        assert_eq!(pattern.pattern.as_deref(), Some(DEMO_PATTERN));
    }
}
