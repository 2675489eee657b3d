//! Line output for consumed records.

use crate::consumer::Consumer;
use crate::error::Result;
use futures::{Stream, StreamExt};
use kafka_types::Record;
use std::io::Write;
use tracing::{debug, info};

/// Writes one line per record:
///
/// ```text
/// {topic}:{partition}:{offset}: key={key} value={value}
/// ```
///
/// A record without a key prints `key=None`.
pub struct RecordPrinter<W: Write> {
    out: W,
    printed: u64,
}

impl<W: Write> RecordPrinter<W> {
    pub fn new(out: W) -> Self {
        Self { out, printed: 0 }
    }

    pub fn format(record: &Record) -> String {
        let key = match &record.key {
            Some(key) => key.to_string(),
            None => "None".to_string(),
        };
        format!(
            "{}:{}:{}: key={} value={}",
            record.topic, record.partition, record.offset, key, record.value
        )
    }

    /// Write and flush one record line.
    pub fn print(&mut self, record: &Record) -> Result<()> {
        writeln!(self.out, "{}", Self::format(record))?;
        self.out.flush()?;
        self.printed += 1;
        Ok(())
    }

    /// Print records from `consumer` until its iteration ends or `limit` records were printed.
    ///
    /// With manual commits configured, each record's offset is committed
    /// after its line was written. Returns the number of records printed.
    pub async fn print_consumer(
        &mut self,
        consumer: &mut Consumer,
        limit: Option<u64>,
    ) -> Result<u64> {
        let manual_commit = consumer.config().manual_commit();
        let mut count = 0u64;

        while limit.is_none_or(|max| count < max) {
            let Some(record) = consumer.next().await? else {
                break;
            };
            self.print(&record)?;
            if manual_commit {
                consumer.commit(&record).await?;
            }
            count += 1;
        }

        info!("Printed {count} records");
        Ok(count)
    }

    /// Print every record of `stream`, stopping at the first error.
    pub async fn print_stream<S>(&mut self, stream: S) -> Result<u64>
    where
        S: Stream<Item = Result<Record>>,
    {
        futures::pin_mut!(stream);
        let mut count = 0u64;
        while let Some(record) = stream.next().await {
            self.print(&record?)?;
            count += 1;
        }
        debug!("Stream ended after {count} records");
        Ok(count)
    }

    /// Total lines written by this printer.
    pub fn printed(&self) -> u64 {
        self.printed
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
