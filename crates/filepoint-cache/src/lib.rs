//! Cache Layer (spec.md §4.5): two independent caches over the same Redis
//! substrate, with a `filepoint::` key namespace — the prefix-list cache
//! (folder listings) and the signed-URL cache.

pub mod prefix_list;
pub mod signed_url;

use std::time::Duration;
use thiserror::Error;

pub use prefix_list::PrefixListCache;
pub use signed_url::SignedUrlCache;

pub const KEY_NAMESPACE: &str = "filepoint::";

/// TTL for prefix-list entries (spec.md §3).
pub const PREFIX_LIST_TTL: Duration = Duration::from_secs(12 * 60 * 60);

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type CacheResult<T> = Result<T, CacheError>;

impl From<CacheError> for filepoint_core::AppError {
    fn from(err: CacheError) -> Self {
        filepoint_core::AppError::UpstreamTransient(err.into())
    }
}

pub(crate) fn namespaced(key: &str) -> String {
    format!("{KEY_NAMESPACE}{key}")
}
