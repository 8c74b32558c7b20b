//! Object-Store Gateway trait (spec.md §4.6).
//!
//! A uniform put/get/list/delete/tag/sign surface over a blob store, so the
//! dispatch service and the worker never talk to S3 (or any other backend)
//! directly.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use std::collections::HashMap;
use thiserror::Error;

pub const TEMPORARY_FILE_TAG: &str = "temporary-file";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("upload failed: {0}")]
    UploadFailed(String),
    #[error("download failed: {0}")]
    DownloadFailed(String),
    #[error("delete failed: {0}")]
    DeleteFailed(String),
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("storage backend error: {0}")]
    BackendError(String),
    #[error("configuration error: {0}")]
    ConfigError(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for filepoint_core::AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(m) => filepoint_core::AppError::NotFound(m),
            StorageError::ConfigError(m) => filepoint_core::AppError::UpstreamFatal(m),
            other => filepoint_core::AppError::UpstreamTransient(other.into()),
        }
    }
}

/// Metadata-only view of an object, as returned by `head`.
#[derive(Debug, Clone)]
pub struct ObjectInfo {
    pub size: u64,
    pub content_type: Option<String>,
    pub metadata: HashMap<String, String>,
}

/// Capabilities exposed to the dispatch service and the worker (spec.md §4.6).
#[async_trait]
pub trait Storage: Send + Sync {
    /// Single-shot PUT. `tag`, when set, is written as object-level tagging
    /// (the `temporary-file` tag drives lifecycle cleanup of temp objects).
    async fn put(
        &self,
        prefix: &str,
        data: Bytes,
        content_type: &str,
        metadata: HashMap<String, String>,
        tag: Option<&str>,
    ) -> StorageResult<()>;

    /// Multipart upload for large files (video strategy).
    async fn put_chunked(
        &self,
        prefix: &str,
        data: Bytes,
        content_type: &str,
        metadata: HashMap<String, String>,
        tag: Option<&str>,
    ) -> StorageResult<()>;

    /// Streaming GET.
    async fn get(&self, prefix: &str) -> StorageResult<BoxStream<'static, StorageResult<Bytes>>>;

    /// Metadata only, no body transfer.
    async fn head(&self, prefix: &str) -> StorageResult<ObjectInfo>;

    /// Paginated listing, fully drained before returning (spec.md §4.6).
    async fn list(&self, folder: &str) -> StorageResult<Vec<String>>;

    async fn delete(&self, prefix: &str) -> StorageResult<()>;

    async fn delete_many(&self, prefixes: &[String]) -> StorageResult<()>;

    async fn tag_set(&self, prefix: &str, tags: HashMap<String, String>) -> StorageResult<()>;

    /// Returns the tag set and whether the `temporary-file` tag is present.
    async fn tag_get(&self, prefix: &str) -> StorageResult<(HashMap<String, String>, bool)>;

    /// Authority chain (spec.md §4.6): signed edge-distribution URL when
    /// configured, else a direct pre-signed URL, else (development profile)
    /// an unsigned direct URL against the configured endpoint.
    async fn sign(&self, prefix: &str, expires_at: DateTime<Utc>) -> StorageResult<String>;
}
