//! Minimal Landlock sandbox setup for Linux.
//!
//! Best-effort hardening: if Landlock is unavailable or setup fails (older
//! kernel, missing permissions), log and continue without sandboxing rather
//! than crash the service.

#[cfg(target_os = "linux")]
pub mod linux {
    use landlock::{
        path_beneath_rules, Access, AccessFs, Ruleset, RulesetAttr, RulesetCreatedAttr,
        RulesetStatus, ABI,
    };
    use tracing::{info, warn};

    /// Allows read-only access to `/app` (binary, migrations, static assets);
    /// denies write access outside the paths the service actually writes to.
    pub fn init() {
        let abi = ABI::V1;
        let access_all = AccessFs::from_all(abi);
        let access_read = AccessFs::from_read(abi);

        let ruleset = Ruleset::default();
        let result = ruleset
            .handle_access(access_all)
            .and_then(|r| r.create())
            .and_then(|r| r.add_rules(path_beneath_rules(&["/app"], access_read)))
            .and_then(|r| r.restrict_self());

        match result {
            Ok(status) => match status.ruleset {
                RulesetStatus::FullyEnforced => {
                    info!(?status, "landlock sandbox fully enforced for /app")
                }
                RulesetStatus::PartiallyEnforced => {
                    info!(?status, "landlock sandbox partially enforced for /app")
                }
                RulesetStatus::NotEnforced => {
                    warn!(?status, "landlock ruleset not enforced by this kernel")
                }
            },
            Err(err) => warn!(?err, "landlock not enabled; continuing without sandbox"),
        }
    }
}

#[cfg(not(target_os = "linux"))]
pub mod linux {
    pub fn init() {}
}
