//! Worker Service + Retry/Poison Middleware (spec.md §4.3, §4.4).
//!
//! Subscribes to the upload topic; runs the Stage A (materialize temp) /
//! Stage B (fan-out transform+upload) / Stage C (commit row) pipeline;
//! wraps it in exponential-backoff retry with a poison-topic terminal sink;
//! throttles global handler invocation rate.

pub mod context;
pub mod pipeline;
pub mod poison;
pub mod retry;
pub mod router;
pub mod throttle;

pub use context::WorkerContext;
pub use pipeline::{process_message, UploadOutcome};
