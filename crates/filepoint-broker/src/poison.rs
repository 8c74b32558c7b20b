//! In-process poison topic. Distinct from the real broker: once the retry
//! middleware exhausts `RetryConfig::max_attempts` for a message, it routes
//! here instead of back to Kafka/SQS, and a dedicated consumer drains it to
//! fire the failure webhook (spec.md §4.4).

use crate::message::BrokerMessage;
use crate::traits::{Acker, BrokerError, BrokerResult, Delivery, Publisher, Subscriber};
use async_trait::async_trait;
use futures::stream::BoxStream;
use tokio::sync::mpsc;

mod private {
    use tokio::sync::mpsc;

    pub type Sender = mpsc::Sender<super::BrokerMessage>;
    pub type Receiver = mpsc::Receiver<super::BrokerMessage>;
}

/// A no-op acker: poison deliveries have nothing upstream to acknowledge
/// against, the in-process channel already removed the item on receive.
struct NoopAcker;

#[async_trait]
impl Acker for NoopAcker {
    async fn ack(&self) -> BrokerResult<()> {
        Ok(())
    }
}

#[derive(Clone)]
pub struct PoisonTopic {
    sender: private::Sender,
}

pub struct PoisonConsumer {
    receiver: tokio::sync::Mutex<private::Receiver>,
}

impl PoisonTopic {
    /// `capacity` bounds how many poisoned messages can queue before a
    /// publisher backs up; the poison topic is a last resort, not a buffer.
    pub fn new(capacity: usize) -> (Self, PoisonConsumer) {
        let (sender, receiver) = mpsc::channel(capacity);
        (
            Self { sender },
            PoisonConsumer {
                receiver: tokio::sync::Mutex::new(receiver),
            },
        )
    }
}

#[async_trait]
impl Publisher for PoisonTopic {
    async fn publish(&self, _topic: &str, message: BrokerMessage) -> BrokerResult<()> {
        self.sender
            .send(message)
            .await
            .map_err(|e| BrokerError::PublishFailed(e.to_string()))
    }
}

#[async_trait]
impl Subscriber for PoisonConsumer {
    async fn subscribe(&self, _topic: &str) -> BrokerResult<BoxStream<'static, Delivery>> {
        Err(BrokerError::SubscribeFailed(
            "PoisonConsumer::subscribe is not supported; call recv() directly".into(),
        ))
    }
}

impl PoisonConsumer {
    /// Drains one poisoned message at a time. Kept as a direct method
    /// (rather than forcing it through the `Subscriber` trait's stream) since
    /// there is exactly one reader: the failure-webhook emitter.
    pub async fn recv(&self) -> Option<Delivery> {
        let mut receiver = self.receiver.lock().await;
        let message = receiver.recv().await?;
        Some(Delivery::new(message, Box::new(NoopAcker)))
    }
}
