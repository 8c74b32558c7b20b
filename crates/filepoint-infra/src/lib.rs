//! Filepoint Infrastructure Library
//!
//! Cross-cutting collaborators shared by the dispatch service and the
//! worker (spec.md §1: "HTTP framework glue... logger initialization...
//! out of scope [of the pipeline], specified only as collaborator
//! interfaces"):
//!
//! - Request-ID middleware (spec.md §4.8): assigns/propagates `X-Request-Id`.
//! - Webhook Notifier (spec.md §4.7): stateless HTTP POST of outcome envelopes.
//! - SSRF validation for the caller-supplied `webhook_url`.
//! - Telemetry init/teardown (spec.md §9: "global logger... explicit
//!   init/teardown in the startup path; inject into components as values").

pub mod middleware;
pub mod ssrf;
pub mod telemetry;
pub mod webhook;

pub use middleware::{get_request_id, request_id_middleware, RequestId};
pub use ssrf::validate_url_for_ssrf;
pub use telemetry::{init_telemetry, shutdown_telemetry};
pub use webhook::WebhookNotifier;
