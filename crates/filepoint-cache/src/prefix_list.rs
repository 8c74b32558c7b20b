//! Prefix-list cache: folder prefix -> sequence of object prefixes under it.

use crate::{namespaced, CacheResult, PREFIX_LIST_TTL};
use redis::{aio::ConnectionManager, AsyncCommands};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct PrefixListCache {
    client: Arc<redis::Client>,
}

impl PrefixListCache {
    pub fn new(client: Arc<redis::Client>) -> Self {
        Self { client }
    }

    async fn connection(&self) -> CacheResult<ConnectionManager> {
        Ok(ConnectionManager::new(self.client.as_ref().clone()).await?)
    }

    fn key(folder: &str) -> String {
        namespaced(&format!("prefixes:{folder}"))
    }

    pub async fn get(&self, folder: &str) -> CacheResult<Option<Vec<String>>> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn.get(Self::key(folder)).await?;
        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub async fn set(&self, folder: &str, list: &[String], ttl: Duration) -> CacheResult<()> {
        let mut conn = self.connection().await?;
        let raw = serde_json::to_string(list)?;
        let _: () = conn.set_ex(Self::key(folder), raw, ttl.as_secs()).await?;
        Ok(())
    }

    pub async fn del(&self, folder: &str) -> CacheResult<()> {
        let mut conn = self.connection().await?;
        let _: () = conn.del(Self::key(folder)).await?;
        Ok(())
    }

    pub async fn exists(&self, folder: &str) -> CacheResult<bool> {
        let mut conn = self.connection().await?;
        Ok(conn.exists(Self::key(folder)).await?)
    }

    pub async fn ttl(&self, folder: &str) -> CacheResult<Option<Duration>> {
        let mut conn = self.connection().await?;
        let secs: i64 = conn.ttl(Self::key(folder)).await?;
        if secs < 0 {
            Ok(None)
        } else {
            Ok(Some(Duration::from_secs(secs as u64)))
        }
    }

    /// Atomic re-read/modify/write; a no-op if the folder entry doesn't
    /// exist — worker Stage B never speculatively materializes an empty
    /// folder list (spec.md §4.5).
    pub async fn append(&self, folder: &str, key: &str) -> CacheResult<()> {
        let Some(remaining_ttl) = self.ttl(folder).await? else {
            return Ok(());
        };
        let Some(mut list) = self.get(folder).await? else {
            return Ok(());
        };
        if !list.iter().any(|k| k == key) {
            list.push(key.to_string());
        }
        self.set(folder, &list, remaining_ttl).await
    }

    pub fn default_ttl() -> Duration {
        PREFIX_LIST_TTL
    }
}
