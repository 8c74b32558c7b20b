//! SQS-backed `Publisher`/`Subscriber`, selected when `PUBSUB=sqs`. SQS has
//! no native headers, so the metadata map rides as SQS message attributes
//! and the attempt counter still lives there rather than in process memory.

use crate::message::{BrokerMessage, HEADER_MESSAGE_ID, HEADER_PARTITION_KEY};
use crate::traits::{Acker, BrokerError, BrokerResult, Delivery, Publisher, Subscriber};
use async_trait::async_trait;
use aws_sdk_sqs::types::MessageAttributeValue;
use aws_sdk_sqs::Client;
use futures::stream::{self, BoxStream, StreamExt};
use std::collections::HashMap;
use uuid::Uuid;

pub struct SqsBroker {
    client: Client,
    queue_url: String,
}

impl SqsBroker {
    pub async fn new(queue_url: &str) -> Self {
        let sdk_config = aws_config::load_from_env().await;
        let client = Client::new(&sdk_config);
        Self {
            client,
            queue_url: queue_url.to_string(),
        }
    }
}

#[async_trait]
impl Publisher for SqsBroker {
    async fn publish(&self, _topic: &str, message: BrokerMessage) -> BrokerResult<()> {
        let mut attrs = HashMap::new();
        for (key, value) in &message.metadata {
            attrs.insert(
                key.clone(),
                MessageAttributeValue::builder()
                    .data_type("String")
                    .string_value(value)
                    .build()
                    .map_err(|e| BrokerError::PublishFailed(e.to_string()))?,
            );
        }
        attrs.insert(
            HEADER_MESSAGE_ID.to_string(),
            MessageAttributeValue::builder()
                .data_type("String")
                .string_value(message.id.to_string())
                .build()
                .map_err(|e| BrokerError::PublishFailed(e.to_string()))?,
        );

        let body = String::from_utf8_lossy(&message.payload).to_string();
        let mut request = self
            .client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(body)
            .set_message_attributes(Some(attrs));

        if let Some(group) = message.header(HEADER_PARTITION_KEY) {
            request = request
                .message_group_id(group)
                .message_deduplication_id(message.id.to_string());
        }

        request
            .send()
            .await
            .map_err(|e| BrokerError::PublishFailed(e.to_string()))?;
        Ok(())
    }
}

struct SqsAcker {
    client: Client,
    queue_url: String,
    receipt_handle: String,
}

#[async_trait]
impl Acker for SqsAcker {
    async fn ack(&self) -> BrokerResult<()> {
        self.client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(&self.receipt_handle)
            .send()
            .await
            .map_err(|e| BrokerError::AckFailed(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl Subscriber for SqsBroker {
    async fn subscribe(&self, _topic: &str) -> BrokerResult<BoxStream<'static, Delivery>> {
        let client = self.client.clone();
        let queue_url = self.queue_url.clone();

        let stream = stream::unfold((client, queue_url), |(client, queue_url)| async move {
            loop {
                let response = client
                    .receive_message()
                    .queue_url(&queue_url)
                    .max_number_of_messages(1)
                    .wait_time_seconds(20)
                    .message_attribute_names("All")
                    .send()
                    .await;

                let messages = match response {
                    Ok(r) => r.messages.unwrap_or_default(),
                    Err(_) => continue,
                };

                let Some(msg) = messages.into_iter().next() else {
                    continue;
                };

                let mut metadata = HashMap::new();
                if let Some(attrs) = &msg.message_attributes {
                    for (key, value) in attrs {
                        if let Some(s) = &value.string_value {
                            metadata.insert(key.clone(), s.clone());
                        }
                    }
                }

                let payload = msg.body.unwrap_or_default().into_bytes();
                let receipt_handle = match msg.receipt_handle {
                    Some(h) => h,
                    None => continue,
                };

                let id = metadata
                    .get(HEADER_MESSAGE_ID)
                    .and_then(|s| Uuid::parse_str(s).ok())
                    .unwrap_or_else(Uuid::new_v4);
                let message = BrokerMessage { id, payload, metadata };
                let acker = Box::new(SqsAcker {
                    client: client.clone(),
                    queue_url: queue_url.clone(),
                    receipt_handle,
                });

                return Some((Delivery::new(message, acker), (client, queue_url)));
            }
        });

        Ok(stream.boxed())
    }
}
