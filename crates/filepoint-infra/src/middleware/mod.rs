//! Request-ID middleware (spec.md §4.8).

pub mod request_id;

pub use request_id::{get_request_id, request_id_middleware, RequestId};
