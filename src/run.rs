//! Consume session: build the client, print records, stop when told to.

use crate::config::Settings;
use anyhow::Result;
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use topic_tail_kafka::{Client, KafkaSourceFactory, Record, RecordPrinter, SourceFactory};
use tracing::{debug, info};

/// Consume from Kafka and print to stdout. Returns the number of printed records.
pub async fn consume(settings: Settings) -> Result<u64> {
    consume_with(settings, Arc::new(KafkaSourceFactory), std::io::stdout()).await
}

/// Same as [`consume`] with an explicit source factory and output.
pub async fn consume_with<W>(
    settings: Settings,
    factory: Arc<dyn SourceFactory>,
    out: W,
) -> Result<u64>
where
    W: Write + Send + 'static,
{
    let client = Client::with_factory(settings.topics.clone(), settings.consumer.clone(), factory)?;
    info!(
        "Consuming {} from {} (group: {}, auto offset reset: {}, auto commit: {})",
        describe_subscription(&settings),
        settings.consumer.bootstrap_servers.join(","),
        settings.consumer.group_id.as_deref().unwrap_or("<none>"),
        settings.consumer.auto_offset_reset,
        settings.consumer.enable_auto_commit,
    );

    if settings.num_consumers > 1 {
        let client = match &settings.pattern {
            Some(pattern) => client.with_pattern(pattern)?,
            None => client,
        };
        return consume_group(&client, settings.num_consumers, settings.max_messages, out).await;
    }

    let mut consumer = client.create_consumer()?;
    if let Some(pattern) = &settings.pattern {
        consumer.subscribe_pattern(pattern)?;
    }

    let mut printer = RecordPrinter::new(out);
    let printed = printer
        .print_consumer(&mut consumer, settings.max_messages)
        .await?;
    Ok(printed)
}

fn describe_subscription(settings: &Settings) -> String {
    match &settings.pattern {
        Some(pattern) => format!("pattern {pattern}"),
        None => format!("topics [{}]", settings.topics.join(", ")),
    }
}

async fn consume_group<W>(
    client: &Client,
    num_consumers: usize,
    max_messages: Option<u64>,
    out: W,
) -> Result<u64>
where
    W: Write + Send + 'static,
{
    let printer = Arc::new(Mutex::new(RecordPrinter::new(out)));
    let printed = Arc::new(AtomicU64::new(0));

    let processor = {
        let printer = Arc::clone(&printer);
        let printed = Arc::clone(&printed);
        move |record: Record| {
            let printer = Arc::clone(&printer);
            let printed = Arc::clone(&printed);
            async move {
                let mut printer = printer.lock().await;
                if max_messages.is_some_and(|max| printed.load(Ordering::SeqCst) >= max) {
                    drop(printer);
                    // park until aborted so the record is not committed
                    return futures::future::pending().await;
                }
                printer.print(&record)?;
                printed.fetch_add(1, Ordering::SeqCst);
                Ok::<(), topic_tail_kafka::Error>(())
            }
        }
    };

    let mut handles = client.spawn_consumer_group(num_consumers, processor)?;

    // Polling loop: check for completion conditions (max_messages or all consumers done)
    loop {
        sleep(Duration::from_millis(100)).await;

        let mut i = 0;
        while i < handles.len() {
            if !handles[i].is_finished() {
                i += 1;
                continue;
            }
            let handle = handles.swap_remove(i);
            match handle.await? {
                Ok(n) => debug!("Consumer finished after {n} records"),
                Err(e) => {
                    abort_all(&handles);
                    return Err(e.into());
                }
            }
        }

        if handles.is_empty() {
            break;
        }
        if let Some(max) = max_messages {
            if printed.load(Ordering::SeqCst) >= max {
                info!("Reached max_messages limit ({max}), stopping consumers");
                break;
            }
        }
    }

    abort_all(&handles);
    let total = printed.load(Ordering::SeqCst);
    info!("Printed {total} records with {num_consumers} consumers");
    Ok(total)
}

fn abort_all<T>(handles: &[JoinHandle<T>]) {
    for (i, handle) in handles.iter().enumerate() {
        handle.abort();
        debug!("Aborted consumer task {i}");
    }
}
