//! Poison-topic consumer (spec.md §4.4): drains messages the retry
//! middleware gave up on and emits the literal failure webhook
//! `{success:false, location:"", error:"error uploading file"}`. Never
//! retries.

use crate::context::WorkerContext;
use filepoint_broker::PoisonConsumer;
use filepoint_core::{UploadJob, WebhookEnvelope};

pub async fn run(ctx: WorkerContext, consumer: std::sync::Arc<PoisonConsumer>) {
    while let Some(delivery) = consumer.recv().await {
        let envelope = match serde_json::from_slice::<UploadJob>(&delivery.message.payload) {
            Ok(job) => WebhookEnvelope::failure(job.id, job.correlation_id),
            Err(err) => {
                tracing::error!(error = %err, "poison message payload is not a decodable UploadJob");
                WebhookEnvelope::failure(delivery.message.id, String::new())
            }
        };

        ctx.webhook.notify(&envelope).await;

        if let Err(err) = delivery.ack().await {
            tracing::warn!(error = %err, "poison consumer ack failed");
        }
    }
}
