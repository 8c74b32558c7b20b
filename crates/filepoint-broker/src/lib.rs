//! Broker abstraction over the upload topic and the poison topic
//! (spec.md §4.3, §4.4, §6). The transport is selected by `PUBSUB`
//! (`kafka` or `sqs`); callers depend only on `Publisher`/`Subscriber`.

#[cfg(feature = "kafka")]
pub mod kafka;
pub mod message;
pub mod poison;
#[cfg(feature = "sqs")]
pub mod sqs;
pub mod traits;

pub use message::{
    BrokerMessage, HEADER_ATTEMPT, HEADER_EVENT_TYPE, HEADER_OBJECT_PREFIX, HEADER_PARTITION_KEY,
    HEADER_TEMP_PREFIX,
};
pub use poison::{PoisonConsumer, PoisonTopic};
pub use traits::{Acker, BrokerError, BrokerResult, Delivery, Publisher, Subscriber};

use filepoint_core::config::PubSubBackend;
use filepoint_core::Config;
use std::sync::Arc;

/// Builds the publisher for the configured transport. Returned as a single
/// `Arc<dyn Publisher>` since both the dispatch service and the worker only
/// ever publish through one (the upload topic, or a redelivery).
pub async fn create_publisher(config: &Config) -> BrokerResult<Arc<dyn Publisher>> {
    match config.pubsub_backend {
        #[cfg(feature = "kafka")]
        PubSubBackend::Kafka => {
            let group_id = format!("{}-worker", config.upload_topic);
            Ok(Arc::new(kafka::KafkaBroker::new(
                &config.kafka_brokers,
                &group_id,
            )?))
        }
        #[cfg(feature = "sqs")]
        PubSubBackend::Sqs => {
            let queue_url = config.sqs_queue_url.clone().ok_or_else(|| {
                BrokerError::PublishFailed("SQS_QUEUE_URL not configured".into())
            })?;
            Ok(Arc::new(sqs::SqsBroker::new(&queue_url).await))
        }
        #[allow(unreachable_patterns)]
        _ => Err(BrokerError::PublishFailed(
            "no broker backend compiled in for the configured PUBSUB value".into(),
        )),
    }
}

/// Builds the subscriber for the configured transport, for the worker's
/// consume loop over `config.upload_topic`.
pub async fn create_subscriber(config: &Config) -> BrokerResult<Arc<dyn Subscriber>> {
    match config.pubsub_backend {
        #[cfg(feature = "kafka")]
        PubSubBackend::Kafka => {
            let group_id = format!("{}-worker", config.upload_topic);
            Ok(Arc::new(kafka::KafkaBroker::new(
                &config.kafka_brokers,
                &group_id,
            )?))
        }
        #[cfg(feature = "sqs")]
        PubSubBackend::Sqs => {
            let queue_url = config.sqs_queue_url.clone().ok_or_else(|| {
                BrokerError::SubscribeFailed("SQS_QUEUE_URL not configured".into())
            })?;
            Ok(Arc::new(sqs::SqsBroker::new(&queue_url).await))
        }
        #[allow(unreachable_patterns)]
        _ => Err(BrokerError::SubscribeFailed(
            "no broker backend compiled in for the configured PUBSUB value".into(),
        )),
    }
}
