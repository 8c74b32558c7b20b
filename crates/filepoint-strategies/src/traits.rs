//! Strategy trait: per-content-type upload behavior (spec.md §4.1), grounded
//! on the original implementation's `Uploader` interface
//! (`base_uploader.go`/`uploader.go`) — allowed content types, file
//! definitions, and a `transform` hook, generalized from Go's `HandleFile`.

use bytes::Bytes;
use filepoint_core::{AppError, Definition};
use std::collections::HashMap;

/// Result of transforming one definition tier: the encoded bytes, plus the
/// content-type to store them under (the image strategy rewrites this to
/// `image/webp` after re-encoding, mirroring the original's content-type
/// rewrite in `handleImage`).
pub struct TransformedObject {
    pub bytes: Bytes,
    pub content_type: String,
}

pub trait Strategy: Send + Sync {
    /// The event-type key used for exact dispatch (`file`, `image`, `video`).
    fn event_type(&self) -> &'static str;

    /// Allowed MIME types mapped to the file extension used in the stored
    /// object key, e.g. `"image/png" -> "png"`.
    fn content_types(&self) -> &HashMap<&'static str, &'static str>;

    /// Definitions this strategy can produce, in ascending order.
    fn file_definitions(&self) -> &[Definition];

    /// Per-strategy upload size ceiling, enforced before any transform runs.
    fn max_size_bytes(&self) -> u64;

    /// Whether this strategy's worker pipeline stage starts a labeling pass
    /// after upload (§4.3 step 9). File uploads don't; image and video do.
    fn produces_labels(&self) -> bool;

    fn extension_for(&self, content_type: &str) -> Option<&'static str> {
        self.content_types().get(content_type).copied()
    }

    fn accepts_content_type(&self, content_type: &str) -> bool {
        self.content_types().contains_key(content_type)
    }

    /// Produces the bytes to store for `definition`, given the original
    /// upload bytes and content type. The default is a passthrough (file and
    /// video strategies; video re-encoding is out of scope — see
    /// SPEC_FULL.md Non-goals).
    fn transform(
        &self,
        _definition: Definition,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<TransformedObject, AppError> {
        Ok(TransformedObject {
            bytes,
            content_type: content_type.to_string(),
        })
    }
}
