//! Webhook Notifier (spec.md §4.7): HTTP POST of outcome envelopes to a
//! caller-configured `webhook_url`, preceded by a mandatory SSRF check
//! (spec.md §4.7, `validate_url_for_ssrf`) so a caller-controlled URL can't
//! be pointed at an internal service. No retry of its own — failure is
//! logged. Triggered from worker success (via the router's downstream
//! publisher) and the poison consumer (synchronous POST).

use crate::ssrf::validate_url_for_ssrf;
use filepoint_core::WebhookEnvelope;
use reqwest::Client;
use std::time::Duration;

#[derive(Clone)]
pub struct WebhookNotifier {
    client: Client,
    url: String,
    /// Development profile only: lets `webhook_url` point at a local/private
    /// endpoint without tripping the SSRF guard.
    allow_private_ips: bool,
}

impl WebhookNotifier {
    pub fn new(url: String, allow_private_ips: bool) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("reqwest client builds with static config");
        Self {
            client,
            url,
            allow_private_ips,
        }
    }

    /// Validates `self.url` against SSRF, then POSTs the envelope. Logs and
    /// swallows any failure — the caller's webhook endpoint has no upstream
    /// retry lane in this design.
    #[tracing::instrument(skip(self, envelope), fields(id = %envelope.id, success = envelope.success))]
    pub async fn notify(&self, envelope: &WebhookEnvelope) {
        if let Err(err) = validate_url_for_ssrf(&self.url, self.allow_private_ips).await {
            tracing::error!(error = %err, url = %self.url, "webhook URL failed SSRF validation; dropping delivery");
            return;
        }

        match self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(envelope)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                tracing::debug!("webhook delivered");
            }
            Ok(response) => {
                tracing::warn!(status = %response.status(), "webhook endpoint returned non-success status");
            }
            Err(err) => {
                tracing::warn!(error = %err, "webhook delivery failed");
            }
        }
    }
}
