//! Broker message envelope: a JSON payload plus the metadata headers the
//! dispatch service and worker pass between them (spec.md §3, §6).

use std::collections::HashMap;
use uuid::Uuid;

pub const HEADER_EVENT_TYPE: &str = "event-type";
pub const HEADER_OBJECT_PREFIX: &str = "s3-prefix";
pub const HEADER_TEMP_PREFIX: &str = "s3-temp-prefix";
pub const HEADER_PARTITION_KEY: &str = "partition-key";
/// Carries [`BrokerMessage::id`] across the wire. Kafka/SQS have no notion of
/// "message id" that survives redelivery unchanged, so the id — the
/// pipeline's idempotency key (spec.md §3) — rides in metadata like every
/// other header instead.
pub const HEADER_MESSAGE_ID: &str = "message-id";
/// Retry attempt counter, carried in metadata (not process memory) so a
/// message redelivered to a different consumer is still rate-limited
/// correctly (spec.md §9 design notes).
pub const HEADER_ATTEMPT: &str = "x-attempt";

#[derive(Debug, Clone)]
pub struct BrokerMessage {
    /// Equal to `UploadJob.id` — the pipeline's idempotency key.
    pub id: Uuid,
    pub payload: Vec<u8>,
    pub metadata: HashMap<String, String>,
}

impl BrokerMessage {
    pub fn new(id: Uuid, payload: Vec<u8>) -> Self {
        Self {
            id,
            payload,
            metadata: HashMap::new(),
        }
    }

    pub fn with_header(mut self, key: &str, value: impl Into<String>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(|s| s.as_str())
    }

    pub fn attempt(&self) -> u32 {
        self.header(HEADER_ATTEMPT)
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }

    /// Returns a clone with the attempt counter incremented, for re-delivery.
    pub fn with_incremented_attempt(&self) -> Self {
        let mut next = self.clone();
        next.metadata
            .insert(HEADER_ATTEMPT.to_string(), (self.attempt() + 1).to_string());
        next
    }
}
