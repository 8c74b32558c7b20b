//! Collaborators the worker pipeline needs, bundled behind one value so the
//! router, the retry middleware, and the pipeline stages share a single
//! handle (spec.md §9: "inject into components as values rather than
//! accessing the singleton directly to keep tests hermetic").

use filepoint_broker::Publisher;
use filepoint_cache::PrefixListCache;
use filepoint_core::Config;
use filepoint_db::MetadataStore;
use filepoint_infra::WebhookNotifier;
use filepoint_processing::LabelDetector;
use filepoint_storage::Storage;
use filepoint_strategies::StrategyRegistry;
use std::sync::Arc;

#[derive(Clone)]
pub struct WorkerContext {
    pub storage: Arc<dyn Storage>,
    pub metadata_store: Arc<dyn MetadataStore>,
    pub prefix_cache: PrefixListCache,
    pub registry: Arc<StrategyRegistry>,
    pub upload_publisher: Arc<dyn Publisher>,
    pub poison_publisher: Arc<dyn Publisher>,
    pub webhook: WebhookNotifier,
    pub config: Arc<Config>,
    pub label_detector: Arc<dyn LabelDetector>,
}
