use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),

    #[error("Decode error: {0}")]
    Decode(#[from] kafka_types::KafkaTypesError),

    #[error("Protobuf parse error: {0}")]
    ProtobufParse(String),

    #[error("Consumer error: {0}")]
    Consumer(String),

    #[error("Consumer has no subscription; pass topics to the client or call subscribe_pattern")]
    NotSubscribed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;
