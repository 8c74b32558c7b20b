//! S3 (or S3-compatible) backend for the Object-Store Gateway.
//!
//! Built on `object_store`'s `AmazonS3` client, matching the teacher's
//! `S3Storage` construction idiom (`AmazonS3Builder::from_env`).

use crate::cloudfront_sign::CloudFrontSigner;
use crate::traits::{ObjectInfo, Storage, StorageError, StorageResult, TEMPORARY_FILE_TAG};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use futures::StreamExt;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::signer::Signer;
use object_store::{Attribute, AttributeValue, Attributes, Error as ObjectStoreError};
use object_store::{GetOptions, ObjectStore, PutOptions, PutPayload};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Prefix for tag-as-attribute keys. `object_store`'s `Attributes` model
/// carries content headers and free-form metadata but not S3 object tagging
/// directly, so tags are encoded as metadata attributes under this
/// namespace; see DESIGN.md.
const TAG_ATTR_PREFIX: &str = "x-filepoint-tag-";

#[derive(Clone)]
pub struct S3Storage {
    store: AmazonS3,
    bucket: String,
    endpoint_url: Option<String>,
    cloudfront_distribution_url: Option<String>,
    cloudfront_signer: Option<Arc<CloudFrontSigner>>,
    is_development: bool,
}

impl S3Storage {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
        cloudfront_distribution_url: Option<String>,
        cloudfront_key_id: Option<String>,
        cloudfront_private_key_path: Option<String>,
        is_development: bool,
    ) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region)
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        // A distribution host without a key pair serves the origin's own
        // signature (see `sign` below); only build a signer when both halves
        // of the key pair are configured.
        let cloudfront_signer = match (&cloudfront_key_id, &cloudfront_private_key_path) {
            (Some(key_id), Some(key_path)) => Some(Arc::new(
                CloudFrontSigner::load(key_id.clone(), key_path)
                    .map_err(|e| StorageError::ConfigError(e.to_string()))?,
            )),
            _ => None,
        };

        Ok(Self {
            store,
            bucket,
            endpoint_url,
            cloudfront_distribution_url,
            cloudfront_signer,
            is_development,
        })
    }

    fn attributes_for(
        metadata: &HashMap<String, String>,
        content_type: &str,
        tag: Option<&str>,
    ) -> Attributes {
        let mut attrs = Attributes::new();
        attrs.insert(
            Attribute::ContentType,
            AttributeValue::from(content_type.to_string()),
        );
        for (k, v) in metadata {
            attrs.insert(
                Attribute::Metadata(k.clone().into()),
                AttributeValue::from(v.clone()),
            );
        }
        if let Some(tag) = tag {
            attrs.insert(
                Attribute::Metadata(format!("{TAG_ATTR_PREFIX}{tag}").into()),
                AttributeValue::from("true".to_string()),
            );
        }
        attrs
    }

    fn map_not_found(prefix: &str, err: ObjectStoreError) -> StorageError {
        match err {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(prefix.to_string()),
            other => StorageError::BackendError(other.to_string()),
        }
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn put(
        &self,
        prefix: &str,
        data: Bytes,
        content_type: &str,
        metadata: HashMap<String, String>,
        tag: Option<&str>,
    ) -> StorageResult<()> {
        let location = Path::from(prefix.to_string());
        let attrs = Self::attributes_for(&metadata, content_type, tag);
        let opts = PutOptions {
            attributes: attrs,
            ..Default::default()
        };
        self.store
            .put_opts(&location, PutPayload::from(data), opts)
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;
        Ok(())
    }

    async fn put_chunked(
        &self,
        prefix: &str,
        data: Bytes,
        content_type: &str,
        metadata: HashMap<String, String>,
        tag: Option<&str>,
    ) -> StorageResult<()> {
        let location = Path::from(prefix.to_string());
        let attrs = Self::attributes_for(&metadata, content_type, tag);

        let mut upload = self
            .store
            .put_multipart_opts(
                &location,
                object_store::PutMultipartOpts {
                    attributes: attrs,
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

        const PART_SIZE: usize = 8 * 1024 * 1024;
        let mut offset = 0usize;
        while offset < data.len() {
            let end = (offset + PART_SIZE).min(data.len());
            upload
                .put_part(PutPayload::from(data.slice(offset..end)))
                .await
                .map_err(|e| StorageError::UploadFailed(e.to_string()))?;
            offset = end;
        }
        upload
            .complete()
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;
        Ok(())
    }

    async fn get(&self, prefix: &str) -> StorageResult<BoxStream<'static, StorageResult<Bytes>>> {
        let location = Path::from(prefix.to_string());
        let result = self
            .store
            .get(&location)
            .await
            .map_err(|e| Self::map_not_found(prefix, e))?;

        let stream = result
            .into_stream()
            .map(|res| res.map_err(|e| StorageError::DownloadFailed(e.to_string())));
        Ok(Box::pin(stream))
    }

    async fn head(&self, prefix: &str) -> StorageResult<ObjectInfo> {
        let location = Path::from(prefix.to_string());
        let result = self
            .store
            .get_opts(
                &location,
                GetOptions {
                    head: true,
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| Self::map_not_found(prefix, e))?;

        let mut metadata = HashMap::new();
        let mut content_type = None;
        for (attr, value) in result.attributes.iter() {
            match attr {
                Attribute::ContentType => content_type = Some(value.to_string()),
                Attribute::Metadata(key) if !key.starts_with(TAG_ATTR_PREFIX) => {
                    metadata.insert(key.to_string(), value.to_string());
                }
                _ => {}
            }
        }

        Ok(ObjectInfo {
            size: result.meta.size as u64,
            content_type,
            metadata,
        })
    }

    async fn list(&self, folder: &str) -> StorageResult<Vec<String>> {
        let prefix = Path::from(folder.to_string());
        let mut stream = self.store.list(Some(&prefix));

        let keys: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let mut tasks = tokio::task::JoinSet::new();

        while let Some(entry) = stream.next().await {
            let entry = entry.map_err(|e| StorageError::BackendError(e.to_string()))?;
            let keys = keys.clone();
            tasks.spawn(async move {
                keys.lock().await.push(entry.location.to_string());
            });
        }
        while tasks.join_next().await.is_some() {}

        Ok(Arc::try_unwrap(keys)
            .map(|m| m.into_inner())
            .unwrap_or_default())
    }

    async fn delete(&self, prefix: &str) -> StorageResult<()> {
        let location = Path::from(prefix.to_string());
        self.store
            .delete(&location)
            .await
            .map_err(|e| StorageError::DeleteFailed(e.to_string()))?;
        Ok(())
    }

    async fn delete_many(&self, prefixes: &[String]) -> StorageResult<()> {
        let mut tasks = tokio::task::JoinSet::new();
        for prefix in prefixes {
            let store = self.store.clone();
            let prefix = prefix.clone();
            tasks.spawn(async move {
                let location = Path::from(prefix);
                store.delete(&location).await
            });
        }
        while let Some(res) = tasks.join_next().await {
            res.map_err(|e| StorageError::DeleteFailed(e.to_string()))?
                .map_err(|e| StorageError::DeleteFailed(e.to_string()))?;
        }
        Ok(())
    }

    async fn tag_set(&self, prefix: &str, tags: HashMap<String, String>) -> StorageResult<()> {
        let info = self.head(prefix).await?;
        let location = Path::from(prefix.to_string());
        let mut attrs = Attributes::new();
        if let Some(ct) = info.content_type {
            attrs.insert(Attribute::ContentType, AttributeValue::from(ct));
        }
        for (k, v) in &info.metadata {
            attrs.insert(
                Attribute::Metadata(k.clone().into()),
                AttributeValue::from(v.clone()),
            );
        }
        for key in tags.keys() {
            attrs.insert(
                Attribute::Metadata(format!("{TAG_ATTR_PREFIX}{key}").into()),
                AttributeValue::from("true".to_string()),
            );
        }

        // object_store has no in-place metadata update, so tagging is applied
        // by re-writing the object with a copy-to-self via put_opts on a fresh
        // read. For the single tag this gateway ever sets (`temporary-file`),
        // re-fetching the body is acceptable; large objects should set the
        // tag at `put` time instead.
        let body = self
            .get(prefix)
            .await?
            .fold(Vec::new(), |mut acc, chunk| async move {
                if let Ok(chunk) = chunk {
                    acc.extend_from_slice(&chunk);
                }
                acc
            })
            .await;

        self.store
            .put_opts(
                &location,
                PutPayload::from(Bytes::from(body)),
                PutOptions {
                    attributes: attrs,
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| StorageError::BackendError(e.to_string()))?;
        Ok(())
    }

    async fn tag_get(&self, prefix: &str) -> StorageResult<(HashMap<String, String>, bool)> {
        let location = Path::from(prefix.to_string());
        let result = self
            .store
            .get_opts(
                &location,
                GetOptions {
                    head: true,
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| Self::map_not_found(prefix, e))?;

        let mut tags = HashMap::new();
        let mut is_temporary = false;
        for (attr, value) in result.attributes.iter() {
            if let Attribute::Metadata(key) = attr {
                if let Some(tag_name) = key.strip_prefix(TAG_ATTR_PREFIX) {
                    tags.insert(tag_name.to_string(), value.to_string());
                    if tag_name == TEMPORARY_FILE_TAG {
                        is_temporary = true;
                    }
                }
            }
        }
        Ok((tags, is_temporary))
    }

    async fn sign(&self, prefix: &str, expires_at: DateTime<Utc>) -> StorageResult<String> {
        let ttl = (expires_at - Utc::now())
            .to_std()
            .unwrap_or(Duration::from_secs(0));

        if self.is_development {
            let base = self
                .endpoint_url
                .clone()
                .unwrap_or_else(|| format!("https://{}.s3.amazonaws.com", self.bucket));
            return Ok(format!("{}/{}/{}", base.trim_end_matches('/'), self.bucket, prefix));
        }

        match (&self.cloudfront_distribution_url, &self.cloudfront_signer) {
            // Real canned-policy signing: the distribution's own RSA key
            // pair signs `{dist}/{prefix}`, matching `GetSignedObject`'s
            // `sign.NewURLSigner` call in the Go ground truth rather than
            // relabeling the origin's S3 SigV4 signature onto the edge host.
            (Some(dist), Some(signer)) => {
                let resource = format!("{}/{}", dist.trim_end_matches('/'), prefix);
                Ok(signer.sign(&resource, expires_at))
            }
            // Distribution host configured without a key pair: the
            // distribution must be set to allow unsigned requests to the
            // origin, so fall back to the origin's own signed URL.
            (Some(dist), None) => {
                let direct_url = self
                    .store
                    .signed_url(Method::GET, &Path::from(prefix.to_string()), ttl)
                    .await
                    .map_err(|e| StorageError::BackendError(e.to_string()))?;
                let query = direct_url.query().unwrap_or_default();
                Ok(format!("{}/{}?{}", dist.trim_end_matches('/'), prefix, query))
            }
            (None, _) => {
                let direct_url = self
                    .store
                    .signed_url(Method::GET, &Path::from(prefix.to_string()), ttl)
                    .await
                    .map_err(|e| StorageError::BackendError(e.to_string()))?;
                Ok(direct_url.to_string())
            }
        }
    }
}
