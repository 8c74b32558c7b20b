//! Signed-URL cache: object prefix -> cached `{url, metadata, tags, expires, temporary}`.

use crate::{namespaced, CacheResult};
use redis::{aio::ConnectionManager, AsyncCommands};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct SignedUrlCache {
    client: Arc<redis::Client>,
}

impl SignedUrlCache {
    pub fn new(client: Arc<redis::Client>) -> Self {
        Self { client }
    }

    async fn connection(&self) -> CacheResult<ConnectionManager> {
        Ok(ConnectionManager::new(self.client.as_ref().clone()).await?)
    }

    fn key(prefix: &str) -> String {
        namespaced(&format!("signed-url:{prefix}"))
    }

    /// Raw bytes in, raw bytes out — the caller owns the JSON shape so the
    /// cache doesn't need to know the response envelope.
    pub async fn get(&self, prefix: &str) -> CacheResult<Option<Vec<u8>>> {
        let mut conn = self.connection().await?;
        let raw: Option<Vec<u8>> = conn.get(Self::key(prefix)).await?;
        Ok(raw)
    }

    pub async fn set(&self, prefix: &str, bytes: &[u8], ttl: Duration) -> CacheResult<()> {
        let mut conn = self.connection().await?;
        let _: () = conn
            .set_ex(Self::key(prefix), bytes.to_vec(), ttl.as_secs())
            .await?;
        Ok(())
    }

    pub async fn del(&self, prefix: &str) -> CacheResult<()> {
        let mut conn = self.connection().await?;
        let _: () = conn.del(Self::key(prefix)).await?;
        Ok(())
    }

    pub async fn del_many(&self, prefixes: &[String]) -> CacheResult<()> {
        if prefixes.is_empty() {
            return Ok(());
        }
        let mut conn = self.connection().await?;
        let keys: Vec<String> = prefixes.iter().map(|p| Self::key(p)).collect();
        let _: () = conn.del(keys).await?;
        Ok(())
    }
}

/// TTL for a signed-URL cache entry: the signed URL's own expiry minus one
/// hour (spec.md §3), so the cache always expires before the URL does.
pub fn signed_url_ttl(sign_expiry: Duration) -> Duration {
    sign_expiry.saturating_sub(Duration::from_secs(60 * 60))
}
