//! Webhook outcome envelope (spec.md §4.7, §6).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEnvelope {
    pub id: Uuid,
    pub success: bool,
    #[serde(rename = "correlationId")]
    pub correlation_id: String,
    pub location: String,
    pub error: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

impl WebhookEnvelope {
    pub fn success(id: Uuid, correlation_id: String, location: String, labels: Vec<String>) -> Self {
        Self {
            id,
            success: true,
            correlation_id,
            location,
            error: String::new(),
            labels,
        }
    }

    /// `{success:false, error:"error uploading file"}` — the literal failure
    /// message emitted by the poison consumer (spec.md §4.4).
    pub fn failure(id: Uuid, correlation_id: String) -> Self {
        Self {
            id,
            success: false,
            correlation_id,
            location: String::new(),
            error: "error uploading file".to_string(),
            labels: Vec::new(),
        }
    }
}
