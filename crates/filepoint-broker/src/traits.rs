//! Publisher/Subscriber traits over the upload topic (spec.md §4.3, §6).

use crate::message::BrokerMessage;
use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("publish failed: {0}")]
    PublishFailed(String),
    #[error("subscribe failed: {0}")]
    SubscribeFailed(String),
    #[error("ack failed: {0}")]
    AckFailed(String),
}

pub type BrokerResult<T> = Result<T, BrokerError>;

impl From<BrokerError> for filepoint_core::AppError {
    fn from(err: BrokerError) -> Self {
        filepoint_core::AppError::UpstreamTransient(err.into())
    }
}

#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, topic: &str, message: BrokerMessage) -> BrokerResult<()>;
}

/// A delivered message plus its broker-specific acknowledgement.
pub struct Delivery {
    pub message: BrokerMessage,
    acker: Box<dyn Acker>,
}

impl Delivery {
    pub fn new(message: BrokerMessage, acker: Box<dyn Acker>) -> Self {
        Self { message, acker }
    }

    pub async fn ack(self) -> BrokerResult<()> {
        self.acker.ack().await
    }
}

#[async_trait]
pub trait Acker: Send + Sync {
    async fn ack(&self) -> BrokerResult<()>;
}

#[async_trait]
pub trait Subscriber: Send + Sync {
    async fn subscribe(&self, topic: &str) -> BrokerResult<BoxStream<'static, Delivery>>;
}
