use std::collections::BTreeMap;

use confmerge_model::{Change, Conflict, ServiceOp};

/// Where a package touched by a transaction ended up (spec §7 "user-visible
/// behavior").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageState {
    /// The merged/post-removal tree is what's on disk now.
    Committed,
    /// The transaction rolled back; the pre-transaction snapshot is what's
    /// on disk now.
    Reverted,
    /// The package was part of the transaction's input but the merge or
    /// removal produced no change, so nothing was written for it.
    Untouched,
}

/// The outcome of one transaction: every conflict and change recorded per
/// package, the full service restart log, and whether a rollback occurred.
#[derive(Debug, Default, Clone)]
pub struct TransactionReport {
    pub conflicts: BTreeMap<String, Vec<Conflict>>,
    pub changes: BTreeMap<String, Vec<Change>>,
    pub service_ops: Vec<ServiceOp>,
    /// Final disposition of every package the transaction touched.
    pub package_states: BTreeMap<String, PackageState>,
    /// A restart failed or the transaction deadline was exceeded. Set
    /// regardless of whether a rollback was actually performed.
    pub failed: bool,
    /// Already-restarted services were driven back to their prior state,
    /// and their configuration was restored from snapshot, after a
    /// failure. Implies `failed`; never set when
    /// `OrchestratorOptions::rollback_on_failure` is `false`.
    pub rolled_back: bool,
}

impl TransactionReport {
    pub fn is_clean(&self) -> bool {
        !self.failed && self.conflicts.values().all(|c| c.is_empty())
    }

    pub fn all_conflicts(&self) -> impl Iterator<Item = &Conflict> {
        self.conflicts.values().flatten()
    }

    pub fn all_changes(&self) -> impl Iterator<Item = &Change> {
        self.changes.values().flatten()
    }
}
