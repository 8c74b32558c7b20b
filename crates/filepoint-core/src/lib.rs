//! Filepoint Core Library
//!
//! Domain models, error types, and configuration shared across the ingestion
//! pipeline: the dispatch service, the worker, and their collaborators
//! (object-store gateway, metadata-store gateway, cache layer, strategy
//! registry, broker, webhook notifier).

pub mod config;
pub mod error;
pub mod models;
pub mod validation;

pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::definition::Definition;
pub use models::definition::closest_definition;
pub use models::metadata_row::MetadataRow;
pub use models::prefix;
pub use models::upload_job::UploadJob;
pub use models::webhook::WebhookEnvelope;
