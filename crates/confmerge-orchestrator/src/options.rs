use std::path::PathBuf;
use std::time::Duration;

use confmerge_controller::GracePeriod;
use confmerge_merge::MergeOptions;

/// Configuration for a single [`crate::Orchestrator`] transaction (spec §4.5).
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    /// Path the exclusive transaction lock is taken against, e.g.
    /// `/var/lock/confmerge.lock`. The lock file itself never holds
    /// content; its existence is the whole point.
    pub lock_path: PathBuf,
    /// How long to wait for the lock before giving up rather than queuing
    /// indefinitely behind a concurrent transaction.
    pub lock_timeout: Duration,
    pub merge: MergeOptions,
    pub grace: GracePeriod,
    /// Upper bound on the whole restart phase. Exceeding it aborts the
    /// remaining restarts and rolls back everything already restarted.
    pub transaction_deadline: Duration,
    /// Skip the restart plan and restart phase entirely after commit
    /// (spec §6's `no-restart` option). Useful when an embedder wants to
    /// batch several transactions before restarting anything.
    pub skip_restart: bool,
    /// On a restart failure or deadline, restore the snapshot and drive
    /// already-restarted services back to their prior state (default
    /// `true`, per spec §6). When `false`, a failure still halts further
    /// restarts and is still reported, but nothing already committed or
    /// restarted is undone.
    pub rollback_on_failure: bool,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            lock_path: PathBuf::from("/var/lock/confmerge.lock"),
            lock_timeout: Duration::from_secs(5),
            merge: MergeOptions::default(),
            grace: GracePeriod::default(),
            transaction_deadline: Duration::from_secs(60),
            skip_restart: false,
            rollback_on_failure: true,
        }
    }
}
