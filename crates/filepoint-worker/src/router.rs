//! Router: subscribes to the upload topic, throttles handler invocation,
//! runs the Stage A/B/C pipeline through the retry/poison middleware, acks,
//! and triggers the success webhook (spec.md §4.3, §4.4, §5).

use crate::context::WorkerContext;
use crate::pipeline::process_message;
use crate::retry::compute_backoff;
use crate::throttle::Throttle;
use filepoint_broker::{BrokerMessage, Publisher, Subscriber};
use filepoint_core::WebhookEnvelope;
use futures::StreamExt;

/// Runs until the subscriber's stream ends (normally: never, until shutdown
/// drops the subscriber). One task is spawned per delivery, bounded by the
/// throttle's permit supply.
pub async fn run(
    ctx: WorkerContext,
    subscriber: std::sync::Arc<dyn Subscriber>,
    upload_topic: String,
) -> anyhow::Result<()> {
    let throttle = Throttle::new(ctx.config.messages_per_second);
    let mut deliveries = subscriber.subscribe(&upload_topic).await?;

    while let Some(delivery) = deliveries.next().await {
        throttle.acquire().await;
        let ctx = ctx.clone();
        let upload_topic = upload_topic.clone();
        tokio::spawn(async move {
            handle_delivery(&ctx, delivery, &upload_topic).await;
        });
    }

    Ok(())
}

async fn handle_delivery(ctx: &WorkerContext, delivery: filepoint_broker::Delivery, upload_topic: &str) {
    let message = delivery.message.clone();
    match process_message(ctx, &message).await {
        Ok(outcome) => {
            if let Err(err) = delivery.ack().await {
                tracing::warn!(error = %err, "ack failed after successful processing");
            }
            let envelope = WebhookEnvelope::success(
                outcome.job.id,
                outcome.job.correlation_id.clone(),
                outcome.object_prefix.clone(),
                outcome.labels.clone(),
            );
            ctx.webhook.notify(&envelope).await;
        }
        Err(err) => {
            if let Err(ack_err) = delivery.ack().await {
                tracing::warn!(error = %ack_err, "ack failed after handler error");
            }
            route_failed_message(ctx, message, &err, upload_topic).await;
        }
    }
}

/// `UpstreamFatal` skips straight to the poison path (spec.md §7: "wrapped
/// so retry does not help"); every other error goes through the
/// exponential-backoff retry loop until `max_attempts` is exhausted.
async fn route_failed_message(
    ctx: &WorkerContext,
    message: BrokerMessage,
    err: &filepoint_core::AppError,
    upload_topic: &str,
) {
    let is_fatal = matches!(err, filepoint_core::AppError::UpstreamFatal(_));
    let attempt = message.attempt();

    if !is_fatal && attempt + 1 < ctx.config.retry.max_attempts {
        let backoff = compute_backoff(&ctx.config.retry, attempt);
        let redelivery = message.with_incremented_attempt();
        let publisher = ctx.upload_publisher.clone();
        let topic = upload_topic.to_string();
        tracing::warn!(error = %err, attempt, delay_secs = backoff.as_secs_f64(), "upload job failed, scheduling retry");
        tokio::spawn(async move {
            tokio::time::sleep(backoff).await;
            if let Err(publish_err) = publisher.publish(&topic, redelivery).await {
                tracing::error!(error = %publish_err, "failed to republish message for retry");
            }
        });
        return;
    }

    tracing::error!(error = %err, attempt, "upload job exhausted retries, routing to poison topic");
    if let Err(publish_err) = ctx.poison_publisher.publish("poison", message).await {
        tracing::error!(error = %publish_err, "failed to publish to poison topic");
    }
}
