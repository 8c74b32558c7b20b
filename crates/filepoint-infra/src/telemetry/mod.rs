//! Global logger init/teardown (spec.md §9): a process-wide singleton with
//! explicit init/teardown in the startup path, injected into components as
//! a value rather than accessed directly, to keep tests hermetic.

mod init_basic;

pub use init_basic::{init_telemetry, shutdown_telemetry};
