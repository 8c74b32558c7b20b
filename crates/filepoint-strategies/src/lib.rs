//! Strategy registry (spec.md §4.1): per-content-type upload behavior —
//! allowed MIME types, size ceilings, definition tiers, and the transform
//! each strategy applies before an object is stored.

pub mod file;
pub mod image;
pub mod registry;
pub mod traits;
pub mod video;

pub use file::FileStrategy;
pub use image::ImageStrategy;
pub use registry::StrategyRegistry;
pub use traits::{Strategy, TransformedObject};
pub use video::VideoStrategy;
