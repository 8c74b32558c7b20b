//! Upload surface (spec.md §6): dispatch, signed-URL read, folder/list reads,
//! single-object delete, partition delete.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Extension, Multipart, Query, State};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use filepoint_broker::message::{HEADER_EVENT_TYPE, HEADER_OBJECT_PREFIX, HEADER_PARTITION_KEY, HEADER_TEMP_PREFIX};
use filepoint_broker::BrokerMessage;
use filepoint_core::{prefix, AppError, Definition, MetadataRow, UploadJob};
use filepoint_infra::RequestId;
use filepoint_storage::{Storage, TEMPORARY_FILE_TAG};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::HttpAppError;
use crate::state::AppState;
use crate::validation::validate_upload_job;

/// Signed URLs are cached with a TTL one hour shorter than this (spec.md §4.5).
const SIGN_EXPIRY: Duration = Duration::from_secs(24 * 60 * 60);

pub async fn health() -> &'static str {
    "OK"
}

#[derive(Debug, Serialize, Deserialize, Clone, utoipa::ToSchema)]
pub struct SignedUrlResponse {
    pub url: String,
    pub metadata: HashMap<String, String>,
    pub tags: HashMap<String, String>,
    pub expires: chrono::DateTime<Utc>,
    pub temporary: bool,
}

/// Validates that `prefix` addresses exactly one upload beneath its owner:
/// a folder-shaped prefix (no extension on the last segment) with exactly
/// two segments, `owner/<id>`. The existing `require_depth_one` in
/// filepoint-core validates the single-segment, owner-only partition root
/// used by `DELETE /upload/all`; this is the per-object counterpart for the
/// single-asset routes.
fn require_object_prefix(prefix_str: &str) -> Result<(), AppError> {
    if !prefix::is_folder(prefix_str) {
        return Err(AppError::InvalidInput(format!(
            "prefix '{prefix_str}' is not a folder prefix"
        )));
    }
    let segments = prefix_str.trim_end_matches('/').split('/').filter(|s| !s.is_empty()).count();
    if segments != 2 {
        return Err(AppError::InvalidInput(format!(
            "prefix '{prefix_str}' must address exactly one object beneath its owner"
        )));
    }
    Ok(())
}

fn parse_owner(prefix_str: &str) -> Result<Uuid, AppError> {
    let owner = prefix::owner_of(prefix_str)
        .ok_or_else(|| AppError::InvalidInput(format!("prefix '{prefix_str}' has no owner segment")))?;
    Uuid::parse_str(&owner).map_err(|_| AppError::InvalidInput(format!("owner '{owner}' is not a UUID")))
}

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    prefix: String,
    #[serde(default)]
    definition: Option<Definition>,
}

pub async fn upload(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    axum::extract::ConnectInfo(socket_addr): axum::extract::ConnectInfo<std::net::SocketAddr>,
    headers: axum::http::HeaderMap,
    mut multipart: Multipart,
) -> Result<Response, HttpAppError> {
    // `request_id_middleware` already assigned/propagated this as
    // `X-Request-Id`; reusing it here (rather than minting a fresh one)
    // is what lets the broker message id and the webhook envelope's `id`
    // thread back to the header the caller received (spec.md §4.8).
    let request_id = Uuid::parse_str(&request_id.0).unwrap_or_else(|_| Uuid::new_v4());
    let client_ip = crate::ip_extraction::extract_client_ip(&headers, Some(&socket_addr), 0);

    let mut owner: Option<Uuid> = None;
    let mut title: Option<String> = None;
    let mut author: Option<String> = None;
    let mut correlation_id: Option<String> = None;
    let mut filename: Option<String> = None;
    let mut content_type: Option<String> = None;
    let mut bytes: Option<bytes::Bytes> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("invalid multipart body: {e}")))?
    {
        match field.name().unwrap_or_default() {
            "userId" => {
                let value = field.text().await.map_err(|e| AppError::InvalidInput(e.to_string()))?;
                owner = Some(
                    Uuid::parse_str(&value)
                        .map_err(|_| AppError::InvalidInput("userId must be a UUID".to_string()))?,
                );
            }
            "title" => title = Some(field.text().await.map_err(|e| AppError::InvalidInput(e.to_string()))?),
            "author" => author = Some(field.text().await.map_err(|e| AppError::InvalidInput(e.to_string()))?),
            "correlationId" => {
                correlation_id = Some(field.text().await.map_err(|e| AppError::InvalidInput(e.to_string()))?)
            }
            "content" => {
                filename = field.file_name().map(|s| s.to_string());
                content_type = field.content_type().map(|s| s.to_string());
                bytes = Some(field.bytes().await.map_err(|e| AppError::InvalidInput(e.to_string()))?);
            }
            _ => {
                let _ = field.bytes().await;
            }
        }
    }

    let owner = owner.ok_or_else(|| AppError::InvalidInput("userId is required".to_string()))?;
    let content_type =
        content_type.ok_or_else(|| AppError::InvalidInput("content part is missing a Content-Type".to_string()))?;
    let filename = filename.unwrap_or_else(|| "upload".to_string());
    let bytes = bytes.ok_or_else(|| AppError::InvalidInput("content part is required".to_string()))?;

    let (event_type, strategy) = state.registry.by_content_type(&content_type)?;

    let job = UploadJob {
        id: request_id,
        owner,
        title,
        author,
        correlation_id: correlation_id.unwrap_or_default(),
        filename,
        content_type: content_type.clone(),
        size: bytes.len() as u64,
        client_ip,
        occurred_on: Utc::now(),
    };

    validate_upload_job(&job, strategy.max_size_bytes())?;

    let object_prefix = job.object_prefix();
    let temp_prefix = job.temp_prefix();

    let row = MetadataRow {
        owner: job.owner,
        prefix: object_prefix.clone(),
        author: job.author.clone(),
        title: job.title.clone(),
        request_id: job.id,
        correlation_id: job.correlation_id.clone(),
        definitions_map: HashMap::new(),
        file_labels: Vec::new(),
        occurred_on: job.occurred_on,
    };
    state.metadata_store.insert(&row).await?;

    let mut object_metadata = HashMap::new();
    object_metadata.insert("owner".to_string(), job.owner.to_string());
    object_metadata.insert("filename".to_string(), job.filename.clone());
    state
        .storage
        .put(&temp_prefix, bytes, &content_type, object_metadata, Some(TEMPORARY_FILE_TAG))
        .await?;

    let payload = serde_json::to_vec(&job).map_err(|e| AppError::Internal(e.to_string()))?;
    let message = BrokerMessage::new(job.id, payload)
        .with_header(HEADER_EVENT_TYPE, event_type)
        .with_header(HEADER_OBJECT_PREFIX, object_prefix.clone())
        .with_header(HEADER_TEMP_PREFIX, temp_prefix)
        .with_header(HEADER_PARTITION_KEY, job.owner.to_string());

    state
        .upload_publisher
        .publish(&state.config.upload_topic, message)
        .await?;

    let mut response = (StatusCode::ACCEPTED, Json(serde_json::json!({ "id": job.id }))).into_response();
    if let Ok(header) = HeaderValue::from_str(r#"{"id":"uuid","success":"bool","correlationId":"string","location":"string","error":"string"}"#) {
        response.headers_mut().insert("Webhook-Request-Body", header);
    }
    Ok(response)
}

async fn resolve_signed_url(
    state: &AppState,
    row: &MetadataRow,
    requested: Definition,
) -> Result<SignedUrlResponse, HttpAppError> {
    if row.is_empty_definitions() {
        return Err(HttpAppError::from(AppError::InvalidInput(
            "asset is still a temporary file; no variant is available yet".to_string(),
        )));
    }

    let available = row.available_definitions();
    let closest = filepoint_core::closest_definition(&available, requested)
        .ok_or_else(|| AppError::NotFound("no definitions available for prefix".to_string()))?;
    let key = row
        .get_definition_key(closest)
        .ok_or_else(|| AppError::Internal("resolved definition missing from definitions_map".to_string()))?
        .clone();

    if let Some(cached) = state.signed_url_cache.get(&key).await? {
        if let Ok(response) = serde_json::from_slice::<SignedUrlResponse>(&cached) {
            if !response.temporary {
                return Ok(response);
            }
        }
    }

    let (tags, temporary) = state.storage.tag_get(&key).await?;
    let expires = Utc::now() + chrono::Duration::from_std(SIGN_EXPIRY).unwrap_or(chrono::Duration::hours(24));
    let url = state.storage.sign(&key, expires).await?;

    let response = SignedUrlResponse {
        url,
        metadata: HashMap::new(),
        tags,
        expires,
        temporary,
    };

    if !temporary {
        if let Ok(bytes) = serde_json::to_vec(&response) {
            let ttl = filepoint_cache::signed_url::signed_url_ttl(SIGN_EXPIRY);
            let _ = state.signed_url_cache.set(&key, &bytes, ttl).await;
        }
    }

    Ok(response)
}

pub async fn get_upload(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UploadQuery>,
) -> Result<Json<SignedUrlResponse>, HttpAppError> {
    require_object_prefix(&query.prefix)?;
    let owner = parse_owner(&query.prefix)?;

    let row = state
        .metadata_store
        .get(owner, &query.prefix)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("prefix '{}' not found", query.prefix)))?;

    let response = resolve_signed_url(&state, &row, query.definition.unwrap_or(Definition::High)).await?;
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct FolderQuery {
    prefix: String,
}

pub async fn get_upload_folder(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FolderQuery>,
) -> Result<Json<Vec<serde_json::Value>>, HttpAppError> {
    prefix::require_depth_one(&query.prefix)?;

    let keys = full_depth_list(&state.storage, &query.prefix).await?;
    let mut row_prefixes: Vec<String> = keys.iter().map(|k| prefix::folder_of(k)).collect();
    row_prefixes.sort();
    row_prefixes.dedup();

    let entries = fan_out_signed_urls(&state, &row_prefixes, Definition::High).await?;
    Ok(Json(entries))
}

#[derive(Debug, Deserialize)]
pub struct ListBody {
    prefixes: Vec<String>,
    #[serde(default)]
    definition: Option<Definition>,
}

pub async fn post_upload_list(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ListBody>,
) -> Result<Json<Vec<serde_json::Value>>, HttpAppError> {
    let entries = fan_out_signed_urls(&state, &body.prefixes, body.definition.unwrap_or(Definition::High)).await?;
    Ok(Json(entries))
}

async fn fan_out_signed_urls(
    state: &Arc<AppState>,
    row_prefixes: &[String],
    definition: Definition,
) -> Result<Vec<serde_json::Value>, HttpAppError> {
    let tasks = row_prefixes.iter().cloned().map(|row_prefix| {
        let state = state.clone();
        tokio::spawn(async move {
            let owner = match parse_owner(&row_prefix) {
                Ok(owner) => owner,
                Err(_) => return None,
            };
            let row = state.metadata_store.get(owner, &row_prefix).await.ok().flatten()?;
            let detail = resolve_signed_url(&state, &row, definition).await.ok()?;
            Some(serde_json::json!({ row_prefix: detail }))
        })
    });

    let results = futures::future::join_all(tasks).await;
    Ok(results.into_iter().filter_map(|r| r.ok().flatten()).collect())
}

pub async fn delete_upload(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FolderQuery>,
) -> Result<&'static str, HttpAppError> {
    require_object_prefix(&query.prefix)?;
    let owner = parse_owner(&query.prefix)?;

    let row = state
        .metadata_store
        .get(owner, &query.prefix)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("prefix '{}' not found", query.prefix)))?;

    let keys: Vec<String> = row.definitions_map.values().cloned().collect();
    if !keys.is_empty() {
        state.storage.delete_many(&keys).await?;
    }
    state.metadata_store.delete(owner, &query.prefix).await?;

    let _ = state.signed_url_cache.del_many(&keys).await;
    let _ = state.prefix_cache.del(&query.prefix).await;

    Ok("OK")
}

pub async fn delete_upload_all(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FolderQuery>,
) -> Result<&'static str, HttpAppError> {
    prefix::require_depth_one(&query.prefix)?;
    let owner = parse_owner(&query.prefix)?;

    let keys = full_depth_list(&state.storage, &query.prefix).await?;
    let mut row_prefixes: Vec<String> = keys.iter().map(|k| prefix::folder_of(k)).collect();
    row_prefixes.sort();
    row_prefixes.dedup();

    state.metadata_store.delete_partition(owner).await?;
    if !keys.is_empty() {
        state.storage.delete_many(&keys).await?;
    }

    let _ = state.signed_url_cache.del_many(&keys).await;
    for row_prefix in &row_prefixes {
        let _ = state.prefix_cache.del(row_prefix).await;
    }

    Ok("OK")
}

/// Recursively enumerates every leaf object under `folder`, fanning out one
/// task per sub-folder discovered, with the accumulated result guarded by a
/// mutex (spec.md §4.2, §5: "recursion branches execute in parallel with a
/// shared result sink guarded by a mutex").
fn full_depth_list(
    storage: &Arc<dyn Storage>,
    folder: &str,
) -> Pin<Box<dyn Future<Output = Result<Vec<String>, AppError>> + Send>> {
    let storage = storage.clone();
    let folder = folder.to_string();
    Box::pin(async move {
        let sink = Arc::new(Mutex::new(Vec::new()));
        walk_folder(storage, folder, sink.clone()).await?;
        let guard = sink.lock().await;
        Ok(guard.clone())
    })
}

fn walk_folder(
    storage: Arc<dyn Storage>,
    folder: String,
    sink: Arc<Mutex<Vec<String>>>,
) -> Pin<Box<dyn Future<Output = Result<(), AppError>> + Send>> {
    Box::pin(async move {
        let entries = storage.list(&folder).await?;
        let mut subfolders = Vec::new();
        {
            let mut guard = sink.lock().await;
            for entry in entries {
                if prefix::is_folder(&entry) {
                    subfolders.push(entry);
                } else {
                    guard.push(entry);
                }
            }
        }

        let tasks = subfolders.into_iter().map(|subfolder| {
            let storage = storage.clone();
            let sink = sink.clone();
            tokio::spawn(walk_folder(storage, subfolder, sink))
        });

        for task in tasks {
            task.await.map_err(|e| AppError::Internal(e.to_string()))??;
        }

        Ok(())
    })
}
