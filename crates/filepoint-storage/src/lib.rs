//! Object-Store Gateway: a uniform put/get/list/delete/tag/sign surface over
//! a blob store (spec.md §4.6).

pub mod cloudfront_sign;
pub mod factory;
pub mod local;
pub mod s3;
pub mod traits;

pub use factory::create_storage;
pub use local::LocalStorage;
pub use s3::S3Storage;
pub use traits::{ObjectInfo, Storage, StorageError, StorageResult, TEMPORARY_FILE_TAG};
