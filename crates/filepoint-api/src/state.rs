//! Application state: every collaborator the dispatch service's handlers need,
//! bundled behind one `Arc` so handlers share it via Axum's `State` extractor
//! (mirrors `filepoint_worker::WorkerContext`'s "inject as values" approach,
//! spec.md §9).

use filepoint_broker::Publisher;
use filepoint_cache::{PrefixListCache, SignedUrlCache};
use filepoint_core::Config;
use filepoint_db::MetadataStore;
use filepoint_infra::WebhookNotifier;
use filepoint_storage::Storage;
use filepoint_strategies::StrategyRegistry;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub metadata_store: Arc<dyn MetadataStore>,
    pub prefix_cache: PrefixListCache,
    pub signed_url_cache: SignedUrlCache,
    pub registry: Arc<StrategyRegistry>,
    pub upload_publisher: Arc<dyn Publisher>,
    pub webhook: WebhookNotifier,
    pub config: Arc<Config>,
}
