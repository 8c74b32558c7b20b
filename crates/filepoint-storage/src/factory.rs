//! Builds the configured `Storage` backend from `Config`.

use crate::local::LocalStorage;
use crate::s3::S3Storage;
use crate::traits::{Storage, StorageResult};
use filepoint_core::Config;
use std::path::PathBuf;
use std::sync::Arc;

pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    if config.is_development() && config.s3_endpoint.is_none() {
        let base_dir = PathBuf::from(std::env::var("LOCAL_STORAGE_PATH").unwrap_or_else(|_| "./data/storage".to_string()));
        let base_url = std::env::var("LOCAL_STORAGE_BASE_URL")
            .unwrap_or_else(|_| format!("http://{}", config.addr));
        return Ok(Arc::new(LocalStorage::new(base_dir, base_url)));
    }

    let storage = S3Storage::new(
        config.s3_bucket.clone(),
        config.s3_region.clone(),
        config.s3_endpoint.clone(),
        config.cloudfront_distribution_url.clone(),
        config.cloudfront_key_id.clone(),
        config.cloudfront_private_key_path.clone(),
        config.is_development(),
    )?;
    Ok(Arc::new(storage))
}
