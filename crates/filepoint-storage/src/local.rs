//! Filesystem-backed `Storage` for local development and tests.

use crate::traits::{ObjectInfo, Storage, StorageError, StorageResult, TEMPORARY_FILE_TAG};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::{self, BoxStream};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::fs;

#[derive(Serialize, Deserialize, Default)]
struct SidecarMeta {
    content_type: Option<String>,
    metadata: HashMap<String, String>,
    tags: HashMap<String, String>,
}

/// Stores objects under `base_dir`, with a `.meta.json` sidecar per key
/// holding content-type, metadata, and tags (the local filesystem has no
/// native analogue for S3 object tagging).
#[derive(Clone)]
pub struct LocalStorage {
    base_dir: PathBuf,
    base_url: String,
}

impl LocalStorage {
    pub fn new(base_dir: PathBuf, base_url: String) -> Self {
        Self { base_dir, base_url }
    }

    fn object_path(&self, prefix: &str) -> PathBuf {
        self.base_dir.join(prefix)
    }

    fn sidecar_path(&self, prefix: &str) -> PathBuf {
        let mut p = self.object_path(prefix).into_os_string();
        p.push(".meta.json");
        PathBuf::from(p)
    }

    async fn read_sidecar(&self, prefix: &str) -> StorageResult<SidecarMeta> {
        let path = self.sidecar_path(prefix);
        match fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| StorageError::BackendError(e.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(prefix.to_string()))
            }
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    async fn write_sidecar(&self, prefix: &str, meta: &SidecarMeta) -> StorageResult<()> {
        let path = self.sidecar_path(prefix);
        let bytes =
            serde_json::to_vec(meta).map_err(|e| StorageError::BackendError(e.to_string()))?;
        fs::write(path, bytes)
            .await
            .map_err(|e| StorageError::BackendError(e.to_string()))
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn put(
        &self,
        prefix: &str,
        data: Bytes,
        content_type: &str,
        metadata: HashMap<String, String>,
        tag: Option<&str>,
    ) -> StorageResult<()> {
        let path = self.object_path(prefix);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::UploadFailed(e.to_string()))?;
        }
        fs::write(&path, &data)
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

        let mut tags = HashMap::new();
        if let Some(tag) = tag {
            tags.insert(tag.to_string(), "true".to_string());
        }
        self.write_sidecar(
            prefix,
            &SidecarMeta {
                content_type: Some(content_type.to_string()),
                metadata,
                tags,
            },
        )
        .await
    }

    async fn put_chunked(
        &self,
        prefix: &str,
        data: Bytes,
        content_type: &str,
        metadata: HashMap<String, String>,
        tag: Option<&str>,
    ) -> StorageResult<()> {
        self.put(prefix, data, content_type, metadata, tag).await
    }

    async fn get(&self, prefix: &str) -> StorageResult<BoxStream<'static, StorageResult<Bytes>>> {
        let path = self.object_path(prefix);
        let bytes = fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(prefix.to_string())
            } else {
                StorageError::DownloadFailed(e.to_string())
            }
        })?;
        Ok(Box::pin(stream::once(async move {
            Ok(Bytes::from(bytes))
        })))
    }

    async fn head(&self, prefix: &str) -> StorageResult<ObjectInfo> {
        let path = self.object_path(prefix);
        let meta = fs::metadata(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(prefix.to_string())
            } else {
                StorageError::BackendError(e.to_string())
            }
        })?;
        let sidecar = self.read_sidecar(prefix).await.unwrap_or_default();
        Ok(ObjectInfo {
            size: meta.len(),
            content_type: sidecar.content_type,
            metadata: sidecar.metadata,
        })
    }

    async fn list(&self, folder: &str) -> StorageResult<Vec<String>> {
        let root = self.object_path(folder);
        let mut out = Vec::new();
        let mut stack = vec![root.clone()];
        while let Some(dir) = stack.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(e) => e,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(StorageError::BackendError(e.to_string())),
            };
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| StorageError::BackendError(e.to_string()))?
            {
                let path = entry.path();
                if path.extension().map(|e| e == "json").unwrap_or(false) {
                    continue;
                }
                if path.is_dir() {
                    stack.push(path);
                } else if let Ok(rel) = path.strip_prefix(&self.base_dir) {
                    out.push(rel.to_string_lossy().replace('\\', "/"));
                }
            }
        }
        Ok(out)
    }

    async fn delete(&self, prefix: &str) -> StorageResult<()> {
        let path = self.object_path(prefix);
        let _ = fs::remove_file(self.sidecar_path(prefix)).await;
        fs::remove_file(&path)
            .await
            .map_err(|e| StorageError::DeleteFailed(e.to_string()))
    }

    async fn delete_many(&self, prefixes: &[String]) -> StorageResult<()> {
        for prefix in prefixes {
            self.delete(prefix).await?;
        }
        Ok(())
    }

    async fn tag_set(&self, prefix: &str, tags: HashMap<String, String>) -> StorageResult<()> {
        let mut sidecar = self.read_sidecar(prefix).await?;
        sidecar.tags = tags;
        self.write_sidecar(prefix, &sidecar).await
    }

    async fn tag_get(&self, prefix: &str) -> StorageResult<(HashMap<String, String>, bool)> {
        let sidecar = self.read_sidecar(prefix).await?;
        let is_temporary = sidecar.tags.contains_key(TEMPORARY_FILE_TAG);
        Ok((sidecar.tags, is_temporary))
    }

    async fn sign(&self, prefix: &str, _expires_at: DateTime<Utc>) -> StorageResult<String> {
        Ok(format!("{}/{}", self.base_url.trim_end_matches('/'), prefix))
    }
}
