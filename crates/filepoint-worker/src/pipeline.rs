//! Stage A/B/C worker pipeline (spec.md §4.3): download temp, fan-out
//! per-definition transform+upload, label (where the strategy produces
//! labels), commit the metadata row.

use crate::context::WorkerContext;
use bytes::Bytes;
use filepoint_broker::message::{
    BrokerMessage, HEADER_EVENT_TYPE, HEADER_OBJECT_PREFIX, HEADER_TEMP_PREFIX,
};
use filepoint_core::models::prefix::folder_of;
use filepoint_core::{AppError, Definition, UploadJob};
use std::collections::HashMap;
use tokio::io::AsyncWriteExt;

/// What the router needs after a successful handler run to ack and notify.
pub struct UploadOutcome {
    pub job: UploadJob,
    pub object_prefix: String,
    pub labels: Vec<String>,
}

/// Runs Stage A (materialize temp) through Stage C (commit row) for one
/// delivered message. Does not ack — the caller acks on `Ok`, and routes to
/// retry/poison on `Err` (spec.md §4.3 steps 1-11).
#[tracing::instrument(skip(ctx, message), fields(request_id = %message.id))]
pub async fn process_message(
    ctx: &WorkerContext,
    message: &BrokerMessage,
) -> Result<UploadOutcome, AppError> {
    let event_type = message.header(HEADER_EVENT_TYPE).ok_or_else(|| {
        AppError::InvalidInput("message missing event-type metadata header".to_string())
    })?;
    let object_prefix = message
        .header(HEADER_OBJECT_PREFIX)
        .ok_or_else(|| AppError::InvalidInput("message missing s3-prefix metadata header".to_string()))?
        .to_string();
    let temp_prefix = message
        .header(HEADER_TEMP_PREFIX)
        .ok_or_else(|| AppError::InvalidInput("message missing s3-temp-prefix metadata header".to_string()))?
        .to_string();

    let job: UploadJob = serde_json::from_slice(&message.payload)
        .map_err(|e| AppError::InvalidInput(format!("malformed upload job payload: {e}")))?;

    // An unknown event-type is classified the same as a missing header:
    // InvalidInput, not UpstreamFatal, so it flows through ordinary retry
    // and only poisons once `max_attempts` is exhausted (spec.md §4.3 step 2:
    // "missing/unknown event_type … flow through retry and ultimately the
    // poison queue"; ground truth `sender_handlers/upload.go` returns this
    // as a plain handler error routed through the same watermill Retry
    // middleware as everything else).
    let strategy = ctx
        .registry
        .by_event_type(event_type)
        .map_err(|_| AppError::InvalidInput(format!("no strategy registered for event type '{event_type}'")))?;

    ctx.metadata_store
        .get(job.owner, &object_prefix)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("metadata row not found for {object_prefix}")))?;

    // Stage A: materialize the temp object locally; released on every exit
    // path via NamedTempFile's Drop.
    let local_file = download_to_tempfile(ctx, &temp_prefix).await?;
    let local_bytes = tokio::fs::read(local_file.path())
        .await
        .map_err(|e| AppError::UpstreamTransient(e.into()))?;

    // Stage B: fan out per definition. Each task returns an owned
    // (Definition, key) tuple instead of writing into a shared
    // mutex-guarded map (spec.md §9 design notes).
    let definitions = strategy.file_definitions().to_vec();
    let tasks = definitions.into_iter().map(|definition| {
        let ctx = ctx.clone();
        let strategy = strategy.clone();
        let bytes = Bytes::from(local_bytes.clone());
        let job = job.clone();
        let object_prefix = object_prefix.clone();
        tokio::spawn(async move {
            process_definition(&ctx, strategy, definition, bytes, &job, &object_prefix).await
        })
    });

    let results = futures::future::join_all(tasks).await;
    let definitions_map: HashMap<String, String> = results
        .into_iter()
        .filter_map(|joined| match joined {
            Ok(Some(pair)) => Some(pair),
            Ok(None) => None,
            Err(join_err) => {
                tracing::warn!(error = %join_err, "definition task panicked");
                None
            }
        })
        .map(|(definition, key)| (definition.as_str().to_string(), key))
        .collect();

    if definitions_map.is_empty() {
        return Err(AppError::UpstreamTransient(anyhow::anyhow!(
            "all per-definition transforms failed for {object_prefix}"
        )));
    }

    // Object tagging (spec.md §4.3 step 9, §4.7): best-effort, run against
    // the highest-quality stored definition, mirroring `GetLabels(newS3Prefix)`
    // in the ground truth which labels the one object it just finished
    // uploading. File uploads never produce labels; video's detector is a
    // no-op stub (ground truth `StartVideoLabelsDetection` is itself unimplemented).
    let labels = if strategy.produces_labels() {
        let key = definitions_map
            .get(Definition::High.as_str())
            .or_else(|| definitions_map.values().next());
        match key {
            Some(key) => ctx.label_detector.detect_labels(key).await,
            None => Vec::new(),
        }
    } else {
        Vec::new()
    };

    // Stage C: commit. Failure here is fatal for the attempt (spec.md §4.3 step 9).
    ctx.metadata_store
        .update_definitions(
            job.owner,
            &object_prefix,
            definitions_map.clone(),
            labels.clone(),
        )
        .await?;

    // Insert produced keys into the folder's prefix-list cache, only if
    // that cache entry already exists (spec.md §4.5).
    for key in definitions_map.values() {
        let folder = folder_of(key);
        if let Err(err) = ctx.prefix_cache.append(&folder, key).await {
            tracing::warn!(%folder, error = %err, "prefix-list cache append failed");
        }
    }

    Ok(UploadOutcome {
        job,
        object_prefix,
        labels,
    })
}

async fn download_to_tempfile(
    ctx: &WorkerContext,
    temp_prefix: &str,
) -> Result<tempfile::NamedTempFile, AppError> {
    use futures::StreamExt;

    let mut stream = ctx.storage.get(temp_prefix).await?;
    let file = tokio::task::spawn_blocking(tempfile::NamedTempFile::new)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(|e| AppError::UpstreamTransient(e.into()))?;

    let mut async_file = tokio::fs::File::from_std(file.reopen().map_err(|e| AppError::UpstreamTransient(e.into()))?);
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        async_file
            .write_all(&chunk)
            .await
            .map_err(|e| AppError::UpstreamTransient(e.into()))?;
    }
    async_file
        .flush()
        .await
        .map_err(|e| AppError::UpstreamTransient(e.into()))?;

    Ok(file)
}

async fn process_definition(
    ctx: &WorkerContext,
    strategy: std::sync::Arc<dyn filepoint_strategies::Strategy>,
    definition: Definition,
    bytes: Bytes,
    job: &UploadJob,
    object_prefix: &str,
) -> Option<(Definition, String)> {
    let content_type = job.content_type.clone();
    let transform_strategy = strategy.clone();
    let result = tokio::task::spawn_blocking(move || {
        transform_strategy.transform(definition, bytes, &content_type)
    })
    .await;
    let transformed = match result {
        Ok(Ok(transformed)) => transformed,
        Ok(Err(err)) => {
            tracing::warn!(%definition, error = %err, "definition transform failed, skipping");
            return None;
        }
        Err(join_err) => {
            tracing::warn!(%definition, error = %join_err, "definition transform panicked, skipping");
            return None;
        }
    };

    let extension = strategy
        .extension_for(&transformed.content_type)
        .unwrap_or("bin");
    let key = format!("{object_prefix}/{}.{extension}", definition.suffix());

    let mut metadata = HashMap::new();
    metadata.insert("owner".to_string(), job.owner.to_string());
    if let Some(title) = &job.title {
        metadata.insert("title".to_string(), title.clone());
    }
    if let Some(author) = &job.author {
        metadata.insert("author".to_string(), author.clone());
    }
    metadata.insert("filename".to_string(), job.filename.clone());

    match ctx
        .storage
        .put_chunked(&key, transformed.bytes, &transformed.content_type, metadata, None)
        .await
    {
        Ok(()) => Some((definition, key)),
        Err(err) => {
            tracing::warn!(%definition, %key, error = %err, "definition upload failed, skipping");
            None
        }
    }
}
