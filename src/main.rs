//! Command-line interface for topic-tail
//!
//! # Usage Examples
//!
//! ## Consume
//! ```bash
//! # Default: latest offset, background commits
//! topic-tail consume my-topic --group-id my-group
//!
//! # Manual offsets from the beginning of the topic
//! topic-tail consume my-topic --group-id my-group \
//!   --auto-offset-reset earliest --no-auto-commit
//!
//! # JSON payloads, give up after one second without records
//! topic-tail consume my-topic --value-format json --consumer-timeout 1000ms
//!
//! # Pattern subscription, three consumers in one group
//! topic-tail consume --pattern '^awesome.*' --group-id my-group --num-consumers 3
//!
//! # Everything from a config file, overriding one value
//! topic-tail consume --config consumer.yaml --max-messages 100
//! ```
//!
//! ## Demo
//! ```bash
//! topic-tail demo default
//! topic-tail demo manual-commit
//! topic-tail demo json
//! topic-tail demo pattern
//! ```
//!
//! Logs go to stderr and are controlled with `RUST_LOG`, e.g.
//! `RUST_LOG=topic_tail=debug,topic_tail_kafka=debug`.

use anyhow::Context;
use clap::{Parser, Subcommand};
use topic_tail::demo::DemoScenario;
use topic_tail::{run, ConsumeOpts};

#[derive(Parser)]
#[command(name = "topic-tail")]
#[command(about = "Consume Kafka topics and print each record")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Consume topics and print one line per record
    Consume {
        #[command(flatten)]
        opts: ConsumeOpts,
    },

    /// Run one of the canned consumer setups against my-topic / my-group
    Demo {
        /// Which setup to run
        #[arg(value_enum)]
        scenario: DemoScenario,

        /// Kafka bootstrap servers (comma-separated)
        #[arg(
            long,
            value_delimiter = ',',
            default_value = "localhost:9092",
            env = "KAFKA_BOOTSTRAP_SERVERS"
        )]
        bootstrap_servers: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing; stdout is reserved for records
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let settings = match cli.command {
        Commands::Consume { opts } => opts.into_settings()?,
        Commands::Demo {
            scenario,
            bootstrap_servers,
        } => scenario.settings(bootstrap_servers),
    };

    let printed = run::consume(settings)
        .await
        .context("Consuming records failed")?;
    tracing::info!("Done, {printed} records printed");

    Ok(())
}
