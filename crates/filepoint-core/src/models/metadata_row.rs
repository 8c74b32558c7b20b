//! Metadata Row: one row per uploaded asset, keyed by `(owner, prefix)` (spec.md §3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use super::definition::Definition;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MetadataRow {
    pub owner: Uuid,
    pub prefix: String,
    pub author: Option<String>,
    pub title: Option<String>,
    pub request_id: Uuid,
    pub correlation_id: String,
    /// Definition tag -> concrete object key.
    pub definitions_map: HashMap<String, String>,
    /// Optional classification results from a strategy that `produces_labels`.
    pub file_labels: Vec<String>,
    pub occurred_on: DateTime<Utc>,
}

impl MetadataRow {
    pub fn get_definition_key(&self, definition: Definition) -> Option<&String> {
        self.definitions_map.get(definition.as_str())
    }

    pub fn available_definitions(&self) -> Vec<Definition> {
        self.definitions_map
            .keys()
            .filter_map(|k| k.parse().ok())
            .collect()
    }

    pub fn is_empty_definitions(&self) -> bool {
        self.definitions_map.is_empty()
    }
}
