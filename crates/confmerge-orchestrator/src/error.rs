/// Errors from running a transaction end to end.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("failed to acquire transaction lock: {0}")]
    Lock(#[from] confmerge_utils::UtilError),

    #[error(transparent)]
    ConfigStore(#[from] confmerge_config::ConfigStoreError),

    #[error(transparent)]
    Resolver(#[from] confmerge_resolver::ResolverError),

    #[error(transparent)]
    Controller(#[from] confmerge_controller::ControllerError),

    #[error("transaction deadline of {deadline_ms}ms exceeded after restarting {restarted} of {total} services")]
    DeadlineExceeded {
        deadline_ms: u128,
        restarted: usize,
        total: usize,
    },

    #[error("removal of section '{section}' in package '{package}' refused by the preserve-network guard")]
    RemovalGuarded { package: String, section: String },

    /// A commit failed partway through the batch; the snapshot restore for
    /// everything committed so far succeeded, so the transaction is safely
    /// aborted with no net effect (spec §7 "commit failure").
    #[error("commit failed for package '{package}', transaction aborted and snapshot restored: {source}")]
    CommitAborted {
        package: String,
        #[source]
        source: confmerge_config::ConfigStoreError,
    },

    /// A commit failed *and* restoring the snapshot for already-committed
    /// packages also failed. The store may now hold a mix of old and new
    /// package trees; operator intervention is required (spec §7
    /// "unrecoverable").
    #[error("commit failed for package '{package}' and snapshot restore also failed: {detail}")]
    Unrecoverable { package: String, detail: String },
}
