//! End-to-end consume sessions against the in-memory broker double
//!
//! These tests resolve settings the way the CLI does and run them through
//! `run::consume_with`, checking what ends up on the output.

use std::io::Write;
use std::sync::{Arc, Mutex};
use topic_tail::config::{FileConfig, Settings};
use topic_tail::demo::DemoScenario;
use topic_tail::{run, ConsumeOpts};
use topic_tail_kafka::testing::{StubEnd, StubFactory};
use topic_tail_kafka::RawRecord;

/// Output sink that can be inspected after it was moved into the session.
#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    fn lines(&self) -> Vec<String> {
        let bytes = self.0.lock().unwrap().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn opts(topics: &[&str]) -> ConsumeOpts {
    ConsumeOpts {
        topics: topics.iter().map(|t| t.to_string()).collect(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_consume_prints_records_until_source_ends() {
    let factory = Arc::new(StubFactory::new(vec![
        RawRecord::new("my-topic", 0, 0, b"hello".to_vec()),
        RawRecord::new("my-topic", 1, 7, b"world".to_vec()).with_key(b"k1".to_vec()),
    ]));
    let settings = Settings::resolve(&opts(&["my-topic"]), None).unwrap();
    let out = SharedBuf::default();

    let printed = run::consume_with(settings, factory, out.clone())
        .await
        .unwrap();

    assert_eq!(printed, 2);
    assert_eq!(
        out.lines(),
        vec![
            "my-topic:0:0: key=None value=hello",
            "my-topic:1:7: key=k1 value=world",
        ]
    );
}

#[tokio::test]
async fn test_json_values_with_idle_timeout() {
    let factory = Arc::new(
        StubFactory::new(vec![RawRecord::new(
            "my-topic",
            0,
            3,
            br#"{"foo": "bar"}"#.to_vec(),
        )])
        .then(StubEnd::Pending),
    );
    let mut consume = opts(&["my-topic"]);
    consume.value_format = Some(topic_tail::PayloadFormat::Json);
    consume.consumer_timeout = Some("50ms".to_string());
    let settings = Settings::resolve(&consume, None).unwrap();
    let out = SharedBuf::default();

    let printed = run::consume_with(settings, factory, out.clone())
        .await
        .unwrap();

    assert_eq!(printed, 1);
    assert_eq!(out.lines(), vec![r#"my-topic:0:3: key=None value={"foo":"bar"}"#]);
}

#[tokio::test]
async fn test_manual_commit_demo_commits_each_record() {
    let factory = Arc::new(StubFactory::new(vec![
        RawRecord::new("my-topic", 0, 0, b"a".to_vec()),
        RawRecord::new("my-topic", 0, 1, b"b".to_vec()),
    ]));
    let settings = DemoScenario::ManualCommit.settings(vec!["localhost:9092".to_string()]);

    let printed = run::consume_with(settings, factory.clone(), SharedBuf::default())
        .await
        .unwrap();
    assert_eq!(printed, 2);

    let seen = factory.configs();
    assert_eq!(seen[0].auto_offset_reset.as_str(), "earliest");
    assert!(!seen[0].enable_auto_commit);

    let state = factory.states()[0].clone();
    let guard = state.lock().unwrap();
    let offsets: Vec<i64> = guard.commits.iter().map(|c| c[0].offset).collect();
    assert_eq!(offsets, vec![1, 2]);
}

#[tokio::test]
async fn test_pattern_demo_subscribes_by_pattern() {
    let factory = Arc::new(StubFactory::new(vec![RawRecord::new(
        "awesome-1",
        0,
        0,
        b"x".to_vec(),
    )]));
    let settings = DemoScenario::Pattern.settings(vec!["localhost:9092".to_string()]);
    let out = SharedBuf::default();

    run::consume_with(settings, factory.clone(), out.clone())
        .await
        .unwrap();

    let state = factory.states()[0].clone();
    let subscriptions = state.lock().unwrap().subscriptions.clone();
    assert_eq!(subscriptions.len(), 1);
    assert_eq!(subscriptions[0].to_client_topics(), vec!["^awesome.*"]);
    assert_eq!(out.lines(), vec!["awesome-1:0:0: key=None value=x"]);
}

#[tokio::test]
async fn test_max_messages_stops_early() {
    let records = (0..10)
        .map(|i| RawRecord::new("my-topic", 0, i, b"x".to_vec()))
        .collect();
    let factory = Arc::new(StubFactory::new(records));
    let mut consume = opts(&["my-topic"]);
    consume.max_messages = Some(4);
    let settings = Settings::resolve(&consume, None).unwrap();
    let out = SharedBuf::default();

    let printed = run::consume_with(settings, factory, out.clone())
        .await
        .unwrap();
    assert_eq!(printed, 4);
    assert_eq!(out.lines().len(), 4);
}

#[tokio::test]
async fn test_consumer_group_prints_from_every_consumer() {
    let factory = Arc::new(StubFactory::new(vec![
        RawRecord::new("my-topic", 0, 0, b"a".to_vec()),
        RawRecord::new("my-topic", 0, 1, b"b".to_vec()),
    ]));
    let mut consume = opts(&["my-topic"]);
    consume.group_id = Some("my-group".to_string());
    consume.num_consumers = Some(3);
    let settings = Settings::resolve(&consume, None).unwrap();
    let out = SharedBuf::default();

    let printed = run::consume_with(settings, factory.clone(), out.clone())
        .await
        .unwrap();

    // every stub source replays the same records
    assert_eq!(printed, 6);
    assert_eq!(out.lines().len(), 6);
    assert_eq!(factory.configs().len(), 3);
}

#[tokio::test]
async fn test_consumer_group_surfaces_source_errors() {
    let factory = Arc::new(StubFactory::new(vec![]).then(StubEnd::Error("boom".to_string())));
    let mut consume = opts(&["my-topic"]);
    consume.group_id = Some("my-group".to_string());
    consume.num_consumers = Some(2);
    let settings = Settings::resolve(&consume, None).unwrap();

    let err = run::consume_with(settings, factory, SharedBuf::default())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("boom"));
}

#[test]
fn test_config_file_round_trip_through_opts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("consumer.yaml");
    std::fs::write(
        &path,
        "topics: [my-topic]\ngroup_id: my-group\nenable_auto_commit: false\nconsumer_timeout: 2s\n",
    )
    .unwrap();

    let file = FileConfig::from_file(&path).unwrap();
    assert_eq!(file.group_id.as_deref(), Some("my-group"));

    let consume = ConsumeOpts {
        config: Some(path),
        ..Default::default()
    };
    let settings = consume.into_settings().unwrap();
    assert!(settings.consumer.manual_commit());
    assert_eq!(
        settings.consumer.consumer_timeout,
        Some(std::time::Duration::from_secs(2))
    );
}
