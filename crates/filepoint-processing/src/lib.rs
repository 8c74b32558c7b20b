//! Transform functions invoked by the strategy registry's `transform` step
//! (spec.md §4.1, §4.3). Kept separate from `filepoint-strategies` so the
//! registry doesn't need to depend directly on codec crates.

pub mod image_transform;
pub mod labeling;
pub mod labeling_factory;

pub use image_transform::{rasterize_svg, reencode_as_webp, ProcessingError};
pub use labeling::{LabelDetector, NullLabelDetector, RekognitionLabelDetector};
pub use labeling_factory::create_label_detector;
