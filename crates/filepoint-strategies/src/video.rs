//! Video strategy, grounded on `video_type.go`: chunked upload, `high`
//! definition only, transcoding left as a pipeline seam (not implemented —
//! the original's `HandleFile` is itself a `todo: add goffmpeg` passthrough).

use crate::traits::Strategy;
use filepoint_core::Definition;
use std::collections::HashMap;
use std::sync::OnceLock;

pub struct VideoStrategy {
    definitions: Vec<Definition>,
}

impl VideoStrategy {
    pub fn new() -> Self {
        Self {
            definitions: vec![Definition::High],
        }
    }
}

impl Default for VideoStrategy {
    fn default() -> Self {
        Self::new()
    }
}

fn content_types() -> &'static HashMap<&'static str, &'static str> {
    static MAP: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    MAP.get_or_init(|| {
        HashMap::from([
            ("video/mp4", "mp4"),
            ("video/mpeg", "mpeg"),
            ("video/ogg", "ogv"),
        ])
    })
}

impl Strategy for VideoStrategy {
    fn event_type(&self) -> &'static str {
        "video"
    }

    fn content_types(&self) -> &HashMap<&'static str, &'static str> {
        content_types()
    }

    fn file_definitions(&self) -> &[Definition] {
        &self.definitions
    }

    fn max_size_bytes(&self) -> u64 {
        1 << 30
    }

    fn produces_labels(&self) -> bool {
        true
    }
}
