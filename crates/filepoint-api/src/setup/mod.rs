pub mod routes;
pub mod server;

use crate::state::AppState;
use anyhow::Result;
use axum::Router;
use filepoint_broker::PoisonTopic;
use filepoint_cache::{PrefixListCache, SignedUrlCache};
use filepoint_core::Config;
use filepoint_db::PostgresMetadataStore;
use filepoint_infra::WebhookNotifier;
use filepoint_strategies::StrategyRegistry;
use filepoint_worker::context::WorkerContext;
use std::sync::Arc;

/// Poison-queue backlog before a publish blocks; last resort, not a buffer
/// (mirrors [`filepoint_broker::PoisonTopic::new`]'s own doc comment).
const POISON_CAPACITY: usize = 1024;

/// Wires every collaborator from `Config`, builds the router, and spawns the
/// upload-pipeline worker loops in-process alongside the HTTP server (the
/// worker crate is a library with no binary of its own; the dispatch service
/// is the one process that owns both halves).
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, Router)> {
    let db_pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;

    let redis_client = Arc::new(redis::Client::open(config.redis_url.clone())?);

    let storage = filepoint_storage::create_storage(&config).await?;
    let metadata_store: Arc<dyn filepoint_db::MetadataStore> =
        Arc::new(PostgresMetadataStore::new(db_pool));
    let prefix_cache = PrefixListCache::new(redis_client.clone());
    let signed_url_cache = SignedUrlCache::new(redis_client);
    let registry = Arc::new(StrategyRegistry::with_builtins());
    let upload_publisher = filepoint_broker::create_publisher(&config).await?;
    let webhook = WebhookNotifier::new(config.webhook_url.clone(), config.is_development());
    let config = Arc::new(config);

    let state = Arc::new(AppState {
        storage: storage.clone(),
        metadata_store: metadata_store.clone(),
        prefix_cache: prefix_cache.clone(),
        signed_url_cache,
        registry: registry.clone(),
        upload_publisher: upload_publisher.clone(),
        webhook: webhook.clone(),
        config: config.clone(),
    });

    let label_detector = filepoint_processing::create_label_detector(
        &config.s3_bucket,
        &config.s3_region,
        config.is_development(),
    )
    .await;

    spawn_worker(
        config,
        storage,
        metadata_store,
        prefix_cache,
        registry,
        upload_publisher,
        webhook,
        label_detector,
    )
    .await?;

    let router = routes::build_router(state.clone());
    Ok((state, router))
}

async fn spawn_worker(
    config: Arc<Config>,
    storage: Arc<dyn filepoint_storage::Storage>,
    metadata_store: Arc<dyn filepoint_db::MetadataStore>,
    prefix_cache: PrefixListCache,
    registry: Arc<StrategyRegistry>,
    upload_publisher: Arc<dyn filepoint_broker::Publisher>,
    webhook: WebhookNotifier,
    label_detector: Arc<dyn filepoint_processing::LabelDetector>,
) -> Result<()> {
    let (poison_publisher, poison_consumer) = PoisonTopic::new(POISON_CAPACITY);
    let poison_publisher: Arc<dyn filepoint_broker::Publisher> = Arc::new(poison_publisher);
    let poison_consumer = Arc::new(poison_consumer);

    let ctx = WorkerContext {
        storage,
        metadata_store,
        prefix_cache,
        registry,
        upload_publisher: upload_publisher.clone(),
        poison_publisher,
        webhook,
        config: config.clone(),
        label_detector,
    };

    let subscriber = filepoint_broker::create_subscriber(&config).await?;
    let upload_topic = config.upload_topic.clone();

    let router_ctx = ctx.clone();
    tokio::spawn(async move {
        if let Err(err) = filepoint_worker::router::run(router_ctx, subscriber, upload_topic).await
        {
            tracing::error!(error = %err, "worker router loop exited");
        }
    });

    let poison_ctx = ctx;
    tokio::spawn(async move {
        filepoint_worker::poison::run(poison_ctx, poison_consumer).await;
    });

    Ok(())
}
