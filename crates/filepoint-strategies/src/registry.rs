//! Strategy registry, grounded on `uploader.go`'s `GetUploaderByEventType` /
//! `GetUploaderByContentType`. Registration order is deterministic (file,
//! image, video) so content-type dispatch ties resolve the same way every
//! run, unlike the original's Go map iteration.

use crate::file::FileStrategy;
use crate::image::ImageStrategy;
use crate::traits::Strategy;
use crate::video::VideoStrategy;
use filepoint_core::AppError;
use std::sync::Arc;

pub struct StrategyRegistry {
    strategies: Vec<Arc<dyn Strategy>>,
}

impl StrategyRegistry {
    /// Registers the three built-in strategies, in the order the strategy
    /// registry's content-type dispatch consults them.
    pub fn with_builtins() -> Self {
        Self {
            strategies: vec![
                Arc::new(FileStrategy::new()),
                Arc::new(ImageStrategy::new()),
                Arc::new(VideoStrategy::new()),
            ],
        }
    }

    pub fn register(&mut self, strategy: Arc<dyn Strategy>) {
        self.strategies.push(strategy);
    }

    /// Exact-key lookup, used by the worker when the event type is already
    /// known from the broker message header.
    pub fn by_event_type(&self, event_type: &str) -> Result<Arc<dyn Strategy>, AppError> {
        self.strategies
            .iter()
            .find(|s| s.event_type() == event_type)
            .cloned()
            .ok_or_else(|| AppError::InvalidInput(format!("unknown event type '{event_type}'")))
    }

    /// First-match by content type, used by the dispatch service to route an
    /// incoming multipart upload to its strategy.
    pub fn by_content_type(
        &self,
        content_type: &str,
    ) -> Result<(&'static str, Arc<dyn Strategy>), AppError> {
        self.strategies
            .iter()
            .find(|s| s.accepts_content_type(content_type))
            .map(|s| (s.event_type(), s.clone()))
            .ok_or_else(|| {
                AppError::InvalidInput(format!("content type '{content_type}' is not allowed"))
            })
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatches_by_content_type() {
        let registry = StrategyRegistry::with_builtins();
        let (event_type, strategy) = registry.by_content_type("image/png").unwrap();
        assert_eq!(event_type, "image");
        assert!(strategy.accepts_content_type("image/png"));
    }

    #[test]
    fn rejects_unknown_content_type() {
        let registry = StrategyRegistry::with_builtins();
        assert!(registry.by_content_type("application/zip").is_err());
    }

    #[test]
    fn dispatches_by_event_type() {
        let registry = StrategyRegistry::with_builtins();
        let strategy = registry.by_event_type("video").unwrap();
        assert_eq!(strategy.max_size_bytes(), 1 << 30);
    }
}
