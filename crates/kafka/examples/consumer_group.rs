use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use topic_tail_kafka::{Client, ConsumerConfig, JsonDeserializer, OffsetReset, Record};

/// Example running several consumers in one consumer group
///
/// This example shows how to:
/// 1. Configure JSON payload decoding
/// 2. Start from the earliest offset with manual commits
/// 3. Spawn multiple consumers in the same consumer group
/// 4. Count records across all consumers
///
/// To run this example:
/// 1. Start Kafka with Docker
///   docker run -d --name kafka -p 9092:9092 apache/kafka:latest
/// 2. Run the example
///   cargo run -p topic-tail-kafka --example consumer_group

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    match run_main().await {
        Ok(_) => {}
        Err(e) => {
            eprintln!("Error: {e:?}");
            std::process::exit(1);
        }
    }
}

async fn run_main() -> topic_tail_kafka::Result<()> {
    let config = ConsumerConfig::default()
        .with_bootstrap_servers(["localhost:9092"])
        .with_group_id("my-group")
        .with_auto_offset_reset(OffsetReset::Earliest)
        .with_auto_commit(false)
        .with_value_deserializer(JsonDeserializer);

    let client = Client::new(["my-topic"], config)?;
    let processed_count = Arc::new(AtomicU64::new(0));

    let processor = {
        let counter = Arc::clone(&processed_count);
        move |record: Record| {
            let counter = Arc::clone(&counter);
            async move {
                println!(
                    "[Topic {} Partition {}] offset={} value={}",
                    record.topic, record.partition, record.offset, record.value
                );
                let count = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if count % 100 == 0 {
                    println!("Processed {count} messages total");
                }
                Ok(())
            }
        }
    };

    // Each consumer is assigned different partitions by the broker
    println!("Spawning 3 consumers in the same consumer group...");
    let handles = client.spawn_consumer_group(3, processor)?;

    println!("Consumers running. Press Ctrl+C to stop.");
    for (i, handle) in handles.into_iter().enumerate() {
        match handle.await {
            Ok(Ok(n)) => println!("Consumer {i} finished after {n} records"),
            Ok(Err(e)) => eprintln!("Consumer {i} error: {e}"),
            Err(e) => eprintln!("Consumer {i} task error: {e}"),
        }
    }

    Ok(())
}
