//! Kafka-backed `Publisher`/`Subscriber`, grounded on the pack's
//! `FutureProducer`/`FutureRecord` idiom. Partitioning by `owner`
//! (`HEADER_PARTITION_KEY`) gives the per-owner ordering the original
//! `KafkaPartitionKey` marshaler relied on.

use crate::message::{BrokerMessage, HEADER_MESSAGE_ID, HEADER_PARTITION_KEY};
use crate::traits::{Acker, BrokerError, BrokerResult, Delivery, Publisher, Subscriber};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::message::{Header, Headers, Message, OwnedHeaders};
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::TopicPartitionList;
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;

pub struct KafkaBroker {
    producer: FutureProducer,
    brokers: String,
    group_id: String,
}

impl KafkaBroker {
    pub fn new(brokers: &str, group_id: &str) -> BrokerResult<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "10000")
            .create()
            .map_err(|e| BrokerError::PublishFailed(e.to_string()))?;

        Ok(Self {
            producer,
            brokers: brokers.to_string(),
            group_id: group_id.to_string(),
        })
    }
}

#[async_trait]
impl Publisher for KafkaBroker {
    async fn publish(&self, topic: &str, message: BrokerMessage) -> BrokerResult<()> {
        let id = message.id.to_string();
        let mut headers = OwnedHeaders::new();
        for (key, value) in &message.metadata {
            headers = headers.insert(Header {
                key,
                value: Some(value.as_bytes()),
            });
        }
        headers = headers.insert(Header {
            key: HEADER_MESSAGE_ID,
            value: Some(id.as_bytes()),
        });

        let partition_key = message
            .header(HEADER_PARTITION_KEY)
            .map(|s| s.to_string())
            .unwrap_or_default();

        let record = FutureRecord::to(topic)
            .key(&partition_key)
            .payload(&message.payload)
            .headers(headers);

        self.producer
            .send(record, Duration::from_secs(10))
            .await
            .map_err(|(err, _)| BrokerError::PublishFailed(format!("{id}: {err}")))?;
        Ok(())
    }
}

struct KafkaAcker {
    consumer: std::sync::Arc<StreamConsumer>,
    topic: String,
    partition: i32,
    offset: i64,
}

#[async_trait]
impl Acker for KafkaAcker {
    async fn ack(&self) -> BrokerResult<()> {
        let mut tpl = TopicPartitionList::new();
        tpl.add_partition_offset(&self.topic, self.partition, rdkafka::Offset::Offset(self.offset + 1))
            .map_err(|e| BrokerError::AckFailed(e.to_string()))?;
        self.consumer
            .commit(&tpl, CommitMode::Async)
            .map_err(|e| BrokerError::AckFailed(e.to_string()))
    }
}

#[async_trait]
impl Subscriber for KafkaBroker {
    async fn subscribe(&self, topic: &str) -> BrokerResult<BoxStream<'static, Delivery>> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &self.brokers)
            .set("group.id", &self.group_id)
            .set("enable.auto.commit", "false")
            .create()
            .map_err(|e| BrokerError::SubscribeFailed(e.to_string()))?;
        consumer
            .subscribe(&[topic])
            .map_err(|e| BrokerError::SubscribeFailed(e.to_string()))?;

        let consumer = std::sync::Arc::new(consumer);
        let topic = topic.to_string();

        let stream = stream::unfold(consumer, move |consumer| {
            let topic = topic.clone();
            async move {
                loop {
                    match consumer.recv().await {
                        Ok(msg) => {
                            let mut metadata = HashMap::new();
                            if let Some(headers) = msg.headers() {
                                for header in headers.iter() {
                                    if let Some(value) = header.value {
                                        metadata.insert(
                                            header.key.to_string(),
                                            String::from_utf8_lossy(value).to_string(),
                                        );
                                    }
                                }
                            }
                            let payload = msg.payload().unwrap_or_default().to_vec();
                            let id = metadata
                                .get(HEADER_MESSAGE_ID)
                                .and_then(|s| Uuid::parse_str(s).ok())
                                .unwrap_or_else(Uuid::new_v4);
                            let message = BrokerMessage { id, payload, metadata };
                            let acker = Box::new(KafkaAcker {
                                consumer: consumer.clone(),
                                topic: topic.clone(),
                                partition: msg.partition(),
                                offset: msg.offset(),
                            });
                            return Some((Delivery::new(message, acker), consumer));
                        }
                        Err(_) => continue,
                    }
                }
            }
        });

        Ok(stream.boxed())
    }
}
