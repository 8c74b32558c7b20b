//! Image strategy, grounded on `image_type.go`: every definition tier is
//! re-encoded to WEBP and the stored content-type is rewritten accordingly
//! (mirroring `handleImage`'s content-type swap after `bimg.Process`). SVG
//! gets a rasterization pass ahead of the same resize+encode step every
//! other format goes through — `image_type.go` has no vector exception.

use crate::traits::{Strategy, TransformedObject};
use bytes::Bytes;
use filepoint_core::{AppError, Definition};
use std::collections::HashMap;
use std::sync::OnceLock;

pub struct ImageStrategy {
    definitions: Vec<Definition>,
}

impl ImageStrategy {
    pub fn new() -> Self {
        Self {
            definitions: vec![Definition::Low, Definition::Medium, Definition::High],
        }
    }
}

impl Default for ImageStrategy {
    fn default() -> Self {
        Self::new()
    }
}

fn content_types() -> &'static HashMap<&'static str, &'static str> {
    static MAP: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    MAP.get_or_init(|| {
        HashMap::from([
            ("image/png", "png"),
            ("image/jpeg", "jpeg"),
            ("image/jpg", "jpg"),
            ("image/svg+xml", "svg"),
            ("image/webp", "webp"),
            ("image/tiff", "tiff"),
        ])
    })
}

impl Strategy for ImageStrategy {
    fn event_type(&self) -> &'static str {
        "image"
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
        true
    }

    fn transform(
        &self,
        definition: Definition,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<TransformedObject, AppError> {
        let rasterized;
        let source: &[u8] = if content_type == "image/svg+xml" {
            rasterized = filepoint_processing::rasterize_svg(&bytes)?;
            &rasterized
        } else {
            &bytes
        };

        let encoded = filepoint_processing::reencode_as_webp(source, definition)?;
        Ok(TransformedObject {
            bytes: Bytes::from(encoded),
            content_type: "image/webp".to_string(),
        })
    }
}
