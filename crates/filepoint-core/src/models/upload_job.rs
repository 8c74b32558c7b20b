//! Upload Job: the in-flight message published to the broker (spec.md §3).
//!
//! `id` doubles as the originating HTTP request id and the pipeline's
//! idempotency key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Serialized task carrying one file through the pipeline.
///
/// Field bounds for `title`/`author` are taken from the original
/// implementation's `UploadPubSub` view (title 4-100, author 4-30).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UploadJob {
    pub id: Uuid,
    pub owner: Uuid,

    #[validate(length(min = 4, max = 100))]
    pub title: Option<String>,

    #[validate(length(min = 4, max = 30))]
    pub author: Option<String>,

    pub correlation_id: String,

    #[validate(length(min = 1))]
    pub filename: String,

    #[validate(length(min = 1))]
    pub content_type: String,

    pub size: u64,
    pub client_ip: String,
    pub occurred_on: DateTime<Utc>,
}

impl UploadJob {
    /// `max-file-size` custom rule (spec.md §4.9): the strategy installs its
    /// size cap before validating the job.
    pub fn validate_size(&self, max_size_bytes: u64) -> Result<(), crate::AppError> {
        if self.size > max_size_bytes {
            return Err(crate::AppError::InvalidInput(format!(
                "size {} exceeds strategy max of {} bytes",
                self.size, max_size_bytes
            )));
        }
        Ok(())
    }

    /// Final object-location root: `owner/<uuid-v4>`.
    pub fn object_prefix(&self) -> String {
        format!("{}/{}", self.owner, self.id)
    }

    /// Location of the temp-tagged object the worker downloads from. Lives
    /// under the final object prefix so it shares the same owner partition.
    pub fn temp_prefix(&self) -> String {
        format!("{}/tmp", self.object_prefix())
    }
}
