//! File strategy, grounded on `file_type.go`: plain documents, no transform,
//! a single `high` definition, 15 MiB cap.

use crate::traits::Strategy;
use filepoint_core::Definition;
use std::collections::HashMap;
use std::sync::OnceLock;

pub struct FileStrategy {
    definitions: Vec<Definition>,
}

impl FileStrategy {
    pub fn new() -> Self {
        Self {
            definitions: vec![Definition::High],
        }
    }
}

impl Default for FileStrategy {
    fn default() -> Self {
        Self::new()
    }
}

fn content_types() -> &'static HashMap<&'static str, &'static str> {
    static MAP: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    MAP.get_or_init(|| {
        HashMap::from([("text/plain", "txt"), ("application/pdf", "pdf")])
    })
}

impl Strategy for FileStrategy {
    fn event_type(&self) -> &'static str {
        "file"
    }

    fn content_types(&self) -> &HashMap<&'static str, &'static str> {
        content_types()
    }

    fn file_definitions(&self) -> &[Definition] {
        &self.definitions
    }

    fn max_size_bytes(&self) -> u64 {
        15 << 20
    }

    fn produces_labels(&self) -> bool {
        false
    }
}
