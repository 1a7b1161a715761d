//! Transaction orchestrator: the exclusive-lock merge-and-restart protocol
//! that ties the config store, merge engine, service resolver, and service
//! controller together into one all-or-nothing operation (spec §4.5).
//!
//! The steps mirror the teacher's `Sequencer` in spirit — persist intent,
//! walk a todo list, pause/unwind on failure — but here the "todo list" is
//! the restart plan and the unwind is a rollback through the service
//! controller rather than a ref/index restore.

mod error;
mod options;
mod report;
mod resolver;

pub use error::OrchestratorError;
pub use options::OrchestratorOptions;
pub use report::{PackageState, TransactionReport};
pub use resolver::{ServiceResolver, StaticResolver};

use std::collections::BTreeMap;
use std::time::Instant;

use confmerge_config::ConfigStore;
use confmerge_controller::{Clock, InitSystem, ServiceController};
use confmerge_model::{Package, SectionRef};
use confmerge_utils::lockfile::LockFile;
use log::{info, warn};

/// Ties a [`ConfigStore`], an [`InitSystem`], a [`Clock`], and a
/// [`ServiceResolver`] together for one transaction at a time. All four are
/// injected rather than looked up through global state, so the whole
/// protocol can run against fakes in tests.
pub struct Orchestrator<'a, S: ConfigStore, I: InitSystem, C: Clock, R: ServiceResolver> {
    store: &'a S,
    init: &'a I,
    clock: &'a C,
    resolver: &'a R,
    options: OrchestratorOptions,
}

impl<'a, S: ConfigStore, I: InitSystem, C: Clock, R: ServiceResolver> Orchestrator<'a, S, I, C, R> {
    pub fn new(store: &'a S, init: &'a I, clock: &'a C, resolver: &'a R, options: OrchestratorOptions) -> Self {
        Self {
            store,
            init,
            clock,
            resolver,
            options,
        }
    }

    /// Recommit every package in `snapshots` to its pre-transaction value.
    /// Best-effort like the commit-phase restore: keeps going past a failed
    /// restore so as many packages as possible end up back at their
    /// pre-image, then reports which (if any) could not be restored.
    fn revert_config(&self, snapshots: &BTreeMap<String, Package>) -> Result<(), OrchestratorError> {
        let mut failed: Vec<String> = Vec::new();
        for (name, snapshot) in snapshots {
            if self.store.commit(name, snapshot).is_err() {
                failed.push(name.clone());
            }
        }
        if failed.is_empty() {
            Ok(())
        } else {
            warn!("configuration restore failed for package(s): {}", failed.join(", "));
            Err(OrchestratorError::Unrecoverable {
                package: failed.join(", "),
                detail: "service restart failed, configuration rollback could not restore every package's snapshot".to_string(),
            })
        }
    }

    /// Order `package_names` so the commit loop follows the same topology
    /// the restart plan will use, per spec §5's "Ordering guarantees": a
    /// config store that commits per-package must not let a service observe
    /// a partially-merged configuration, so a package whose service depends
    /// on another package's service must commit after it.
    ///
    /// Computed by asking the resolver for a restart plan over every
    /// package's mapped service, then expanding each service back to the
    /// package(s) that map to it (in `package_names`'s original relative
    /// order, for the rare case of two packages sharing one service).
    /// Packages with no service mapping carry no ordering constraint, so
    /// they keep their original relative order, appended after every mapped
    /// package.
    fn commit_order(&self, package_names: &[String]) -> Result<Vec<String>, OrchestratorError> {
        let restart_plan = self.resolver.plan(package_names)?;

        let mut by_service: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut unmapped: Vec<String> = Vec::new();
        for name in package_names {
            match self.resolver.service_for_package(name) {
                Some(service) => by_service.entry(service).or_default().push(name.clone()),
                None => unmapped.push(name.clone()),
            }
        }

        let mut ordered = Vec::with_capacity(package_names.len());
        for service in &restart_plan {
            if let Some(names) = by_service.get(service) {
                ordered.extend(names.iter().cloned());
            }
        }
        ordered.extend(unmapped);
        Ok(ordered)
    }

    /// Record each package's final disposition once a transaction's commit
    /// phase is over: unchanged packages are `Untouched`, changed packages
    /// are `Reverted` if the transaction rolled back and `Committed`
    /// otherwise.
    fn fill_package_states(report: &mut TransactionReport, all_packages: impl Iterator<Item = String>, changed_packages: &[String]) {
        for name in all_packages {
            let state = if !changed_packages.contains(&name) {
                PackageState::Untouched
            } else if report.rolled_back {
                PackageState::Reverted
            } else {
                PackageState::Committed
            };
            report.package_states.insert(name, state);
        }
    }

    /// Merge every package in `incoming` into the config store's current
    /// tree and restart the services that own a changed package, in
    /// dependency order, rolling back on the first restart failure or if
    /// the transaction deadline is exceeded.
    ///
    /// Steps (spec §4.5): acquire lock, snapshot, merge, commit, plan
    /// restarts, restart sequentially with rollback, report.
    pub fn merge_tree(&self, incoming: &BTreeMap<String, Package>) -> Result<TransactionReport, OrchestratorError> {
        let _lock = LockFile::acquire_with_timeout(&self.options.lock_path, self.options.lock_timeout)?;
        info!("transaction lock acquired, merging {} package(s)", incoming.len());

        let mut report = TransactionReport::default();
        let mut merged_packages: BTreeMap<String, Package> = BTreeMap::new();
        let mut changed_packages: Vec<String> = Vec::new();
        let mut snapshots: BTreeMap<String, Package> = BTreeMap::new();

        for (name, incoming_pkg) in incoming {
            let current = match self.store.load(name) {
                Ok(pkg) => pkg,
                Err(confmerge_config::ConfigStoreError::PackageNotFound(_)) => Package::new(name.clone()),
                Err(e) => return Err(e.into()),
            };
            snapshots.insert(name.clone(), current.clone());

            let (merged, conflicts, changes) = confmerge_merge::merge(name, &current, incoming_pkg, &self.options.merge);

            if !changes.is_empty() {
                changed_packages.push(name.clone());
            }
            if !conflicts.is_empty() {
                report.conflicts.insert(name.clone(), conflicts);
            }
            if !changes.is_empty() {
                report.changes.insert(name.clone(), changes);
            }
            merged_packages.insert(name.clone(), merged);
        }

        if self.options.merge.dry_run {
            info!("dry run: skipping commit and restart phases");
            for name in merged_packages.keys() {
                report.package_states.insert(name.clone(), PackageState::Untouched);
            }
            return Ok(report);
        }

        let package_names: Vec<String> = merged_packages.keys().cloned().collect();
        let order = self.commit_order(&package_names)?;

        let mut committed: Vec<&String> = Vec::new();
        for name in &order {
            let merged = &merged_packages[name];
            if let Err(e) = self.store.commit(name, merged) {
                warn!("commit failed for package '{name}', restoring snapshot for {} already-committed package(s)", committed.len());
                let mut restore_failed = false;
                for prev in &committed {
                    if let Some(snapshot) = snapshots.get(*prev) {
                        if self.store.commit(prev, snapshot).is_err() {
                            restore_failed = true;
                        }
                    }
                }
                if restore_failed {
                    return Err(OrchestratorError::Unrecoverable {
                        package: name.clone(),
                        detail: e.to_string(),
                    });
                }
                return Err(OrchestratorError::CommitAborted {
                    package: name.clone(),
                    source: e,
                });
            }
            committed.push(name);
        }

        if self.options.skip_restart {
            info!("no-restart requested: skipping restart phase after commit");
            Self::fill_package_states(&mut report, merged_packages.keys().cloned(), &changed_packages);
            return Ok(report);
        }

        let restart_plan = self.resolver.plan(&changed_packages)?;
        info!("restart plan: {restart_plan:?}");

        let mut controller = ServiceController::new(self.init, self.clock, self.options.grace);
        let deadline = Instant::now() + self.options.transaction_deadline;

        for (i, service) in restart_plan.iter().enumerate() {
            if Instant::now() >= deadline {
                warn!("transaction deadline exceeded after {i} of {} restarts", restart_plan.len());
                report.failed = true;
                if self.options.rollback_on_failure {
                    let undone = controller.rollback();
                    report.service_ops.extend(undone);
                    self.revert_config(&snapshots)?;
                    report.rolled_back = true;
                }
                return Err(OrchestratorError::DeadlineExceeded {
                    deadline_ms: self.options.transaction_deadline.as_millis(),
                    restarted: i,
                    total: restart_plan.len(),
                });
            }

            let op = controller.restart(service)?;

            let failed = matches!(op.outcome, confmerge_model::ServiceOutcome::Err(_));
            report.service_ops.push(op);

            if failed {
                report.failed = true;
                if self.options.rollback_on_failure {
                    warn!("service {service} failed to restart cleanly, rolling back transaction");
                    let undone = controller.rollback();
                    report.service_ops.extend(undone);
                    self.revert_config(&snapshots)?;
                    report.rolled_back = true;
                } else {
                    warn!("service {service} failed to restart cleanly, rollback disabled");
                }
                Self::fill_package_states(&mut report, merged_packages.keys().cloned(), &changed_packages);
                return Ok(report);
            }
        }

        Self::fill_package_states(&mut report, merged_packages.keys().cloned(), &changed_packages);
        Ok(report)
    }

    /// Remove sections matching `targets` (package -> section refs),
    /// refusing any removal the preserve-network guard blocks, then run the
    /// same restart phase as [`Self::merge_tree`].
    pub fn remove_matching(&self, targets: &BTreeMap<String, Vec<SectionRef>>) -> Result<TransactionReport, OrchestratorError> {
        let _lock = LockFile::acquire_with_timeout(&self.options.lock_path, self.options.lock_timeout)?;

        let mut report = TransactionReport::default();
        let mut changed_packages = Vec::new();
        let mut snapshots: BTreeMap<String, Package> = BTreeMap::new();

        for (package, refs) in targets {
            let current = self.store.load(package)?;
            for section_ref in refs {
                let Some(idx) = current.find(section_ref) else {
                    continue;
                };
                if self.options.merge.preserve_network && confmerge_merge::guards_removal(package, &current.sections[idx]) {
                    return Err(OrchestratorError::RemovalGuarded {
                        package: package.clone(),
                        section: section_ref.to_string(),
                    });
                }
            }
            snapshots.insert(package.clone(), current);
        }

        if self.options.merge.dry_run {
            for package in snapshots.keys() {
                report.package_states.insert(package.clone(), PackageState::Untouched);
            }
            return Ok(report);
        }

        let package_names: Vec<String> = targets.keys().cloned().collect();
        let order = self.commit_order(&package_names)?;

        let mut touched: Vec<&String> = Vec::new();
        for package in &order {
            let refs = &targets[package];
            let mut any_removed = false;
            for section_ref in refs {
                match self.store.delete_section(package, section_ref) {
                    Ok(()) => any_removed = true,
                    Err(confmerge_config::ConfigStoreError::SectionNotFound(_)) => continue,
                    Err(e) => {
                        warn!("delete_section failed for package '{package}', restoring snapshot for {} already-touched package(s)", touched.len());
                        let mut restore_failed = false;
                        for prev in &touched {
                            if let Some(snapshot) = snapshots.get(*prev) {
                                if self.store.commit(prev, snapshot).is_err() {
                                    restore_failed = true;
                                }
                            }
                        }
                        if restore_failed {
                            return Err(OrchestratorError::Unrecoverable {
                                package: package.clone(),
                                detail: e.to_string(),
                            });
                        }
                        return Err(OrchestratorError::CommitAborted {
                            package: package.clone(),
                            source: e,
                        });
                    }
                }
            }
            if any_removed {
                changed_packages.push(package.clone());
                touched.push(package);
            }
        }

        if self.options.skip_restart {
            Self::fill_package_states(&mut report, snapshots.keys().cloned(), &changed_packages);
            return Ok(report);
        }

        let restart_plan = self.resolver.plan(&changed_packages)?;
        let mut controller = ServiceController::new(self.init, self.clock, self.options.grace);
        let deadline = Instant::now() + self.options.transaction_deadline;

        for (i, service) in restart_plan.iter().enumerate() {
            if Instant::now() >= deadline {
                warn!("transaction deadline exceeded after {i} of {} restarts", restart_plan.len());
                report.failed = true;
                if self.options.rollback_on_failure {
                    let undone = controller.rollback();
                    report.service_ops.extend(undone);
                    self.revert_config(&snapshots)?;
                    report.rolled_back = true;
                }
                return Err(OrchestratorError::DeadlineExceeded {
                    deadline_ms: self.options.transaction_deadline.as_millis(),
                    restarted: i,
                    total: restart_plan.len(),
                });
            }

            let op = controller.restart(service)?;
            let failed = matches!(op.outcome, confmerge_model::ServiceOutcome::Err(_));
            report.service_ops.push(op);
            if failed {
                report.failed = true;
                if self.options.rollback_on_failure {
                    let undone = controller.rollback();
                    report.service_ops.extend(undone);
                    self.revert_config(&snapshots)?;
                    report.rolled_back = true;
                }
                Self::fill_package_states(&mut report, snapshots.keys().cloned(), &changed_packages);
                return Ok(report);
            }
        }

        Self::fill_package_states(&mut report, snapshots.keys().cloned(), &changed_packages);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confmerge_config::MemoryConfigStore;
    use confmerge_controller::FakeClock;
    use confmerge_controller::FakeInitSystem;
    use confmerge_model::Section;

    fn network_package() -> Package {
        let mut pkg = Package::new("network");
        pkg.push(Section::new(Some("lan".into()), "cfg01", "interface"));
        pkg
    }

    #[test]
    fn merge_tree_commits_and_restarts_changed_services() {
        let _ = env_logger::try_init();
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryConfigStore::new().seed(network_package());
        let init = FakeInitSystem::new();
        let clock = FakeClock::default();
        let resolver = StaticResolver;

        let options = OrchestratorOptions {
            lock_path: dir.path().join("tx.lock"),
            ..Default::default()
        };
        let orchestrator = Orchestrator::new(&store, &init, &clock, &resolver, options);

        let mut incoming = BTreeMap::new();
        let mut incoming_pkg = Package::new("network");
        let mut s = Section::new(Some("lan".into()), "cfg01", "interface");
        s.options.insert("mtu".into(), "1500".into());
        incoming_pkg.push(s);
        incoming.insert("network".to_string(), incoming_pkg);

        let report = orchestrator.merge_tree(&incoming).unwrap();
        assert!(report.is_clean());
        assert_eq!(report.service_ops.len(), 1);
        assert_eq!(report.service_ops[0].service, "network");

        let committed = store.load("network").unwrap();
        assert_eq!(committed.sections[0].options.get("mtu"), Some(&"1500".to_string()));
    }

    #[test]
    fn merge_tree_rolls_back_when_a_restart_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryConfigStore::new().seed(network_package());
        let init = FakeInitSystem::new();
        init.fail("network");
        let clock = FakeClock::default();
        let resolver = StaticResolver;

        let options = OrchestratorOptions {
            lock_path: dir.path().join("tx.lock"),
            ..Default::default()
        };
        let orchestrator = Orchestrator::new(&store, &init, &clock, &resolver, options);

        let mut incoming = BTreeMap::new();
        let mut incoming_pkg = Package::new("network");
        let mut s = Section::new(Some("lan".into()), "cfg01", "interface");
        s.options.insert("mtu".into(), "1500".into());
        incoming_pkg.push(s);
        incoming.insert("network".to_string(), incoming_pkg);

        let report = orchestrator.merge_tree(&incoming).unwrap();
        assert!(report.failed);
        assert!(report.rolled_back);
        assert_eq!(report.package_states.get("network"), Some(&PackageState::Reverted));

        let reverted = store.load("network").unwrap();
        assert!(reverted.sections[0].options.get("mtu").is_none());
    }

    #[test]
    fn merge_tree_skips_restart_phase_when_no_restart_requested() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryConfigStore::new().seed(network_package());
        let init = FakeInitSystem::new();
        let clock = FakeClock::default();
        let resolver = StaticResolver;

        let options = OrchestratorOptions {
            lock_path: dir.path().join("tx.lock"),
            skip_restart: true,
            ..Default::default()
        };
        let orchestrator = Orchestrator::new(&store, &init, &clock, &resolver, options);

        let mut incoming = BTreeMap::new();
        let mut incoming_pkg = Package::new("network");
        let mut s = Section::new(Some("lan".into()), "cfg01", "interface");
        s.options.insert("mtu".into(), "1500".into());
        incoming_pkg.push(s);
        incoming.insert("network".to_string(), incoming_pkg);

        let report = orchestrator.merge_tree(&incoming).unwrap();
        assert!(report.service_ops.is_empty());
        assert!(!report.failed);
        assert_eq!(report.package_states.get("network"), Some(&PackageState::Committed));

        let committed = store.load("network").unwrap();
        assert_eq!(committed.sections[0].options.get("mtu"), Some(&"1500".to_string()));
    }

    #[test]
    fn merge_tree_reports_failure_without_rollback_when_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryConfigStore::new().seed(network_package());
        let init = FakeInitSystem::new();
        init.fail("network");
        let clock = FakeClock::default();
        let resolver = StaticResolver;

        let options = OrchestratorOptions {
            lock_path: dir.path().join("tx.lock"),
            rollback_on_failure: false,
            ..Default::default()
        };
        let orchestrator = Orchestrator::new(&store, &init, &clock, &resolver, options);

        let mut incoming = BTreeMap::new();
        let mut incoming_pkg = Package::new("network");
        let mut s = Section::new(Some("lan".into()), "cfg01", "interface");
        s.options.insert("mtu".into(), "1500".into());
        incoming_pkg.push(s);
        incoming.insert("network".to_string(), incoming_pkg);

        let report = orchestrator.merge_tree(&incoming).unwrap();
        assert!(report.failed);
        assert!(!report.rolled_back);
        assert_eq!(report.service_ops.len(), 1);
        assert_eq!(report.package_states.get("network"), Some(&PackageState::Committed));

        let committed = store.load("network").unwrap();
        assert_eq!(committed.sections[0].options.get("mtu"), Some(&"1500".to_string()));
    }

    #[test]
    fn merge_tree_dry_run_does_not_commit() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryConfigStore::new().seed(network_package());
        let init = FakeInitSystem::new();
        let clock = FakeClock::default();
        let resolver = StaticResolver;

        let options = OrchestratorOptions {
            lock_path: dir.path().join("tx.lock"),
            merge: confmerge_merge::MergeOptions {
                dry_run: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let orchestrator = Orchestrator::new(&store, &init, &clock, &resolver, options);

        let mut incoming = BTreeMap::new();
        let mut incoming_pkg = Package::new("network");
        let mut s = Section::new(Some("lan".into()), "cfg01", "interface");
        s.options.insert("mtu".into(), "1500".into());
        incoming_pkg.push(s);
        incoming.insert("network".to_string(), incoming_pkg);

        orchestrator.merge_tree(&incoming).unwrap();
        let unchanged = store.load("network").unwrap();
        assert!(unchanged.sections[0].options.get("mtu").is_none());
    }

    #[test]
    fn remove_matching_refuses_guarded_section_under_preserve_network() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryConfigStore::new().seed(network_package());
        let init = FakeInitSystem::new();
        let clock = FakeClock::default();
        let resolver = StaticResolver;

        let options = OrchestratorOptions {
            lock_path: dir.path().join("tx.lock"),
            merge: confmerge_merge::MergeOptions {
                preserve_network: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let orchestrator = Orchestrator::new(&store, &init, &clock, &resolver, options);

        let mut targets = BTreeMap::new();
        targets.insert("network".to_string(), vec![SectionRef::Named("lan".into())]);

        let result = orchestrator.remove_matching(&targets);
        assert!(matches!(result, Err(OrchestratorError::RemovalGuarded { .. })));
    }

    #[test]
    fn remove_matching_removes_unguarded_section_and_restarts() {
        let dir = tempfile::tempdir().unwrap();
        let mut pkg = Package::new("network");
        pkg.push(Section::new(Some("lan".into()), "cfg01", "interface"));
        pkg.push(Section::new(Some("wan".into()), "cfg02", "interface"));
        let store = MemoryConfigStore::new().seed(pkg);
        let init = FakeInitSystem::new();
        let clock = FakeClock::default();
        let resolver = StaticResolver;

        let options = OrchestratorOptions {
            lock_path: dir.path().join("tx.lock"),
            ..Default::default()
        };
        let orchestrator = Orchestrator::new(&store, &init, &clock, &resolver, options);

        let mut targets = BTreeMap::new();
        targets.insert("network".to_string(), vec![SectionRef::Named("wan".into())]);

        let report = orchestrator.remove_matching(&targets).unwrap();
        assert!(!report.rolled_back);
        let remaining = store.load("network").unwrap();
        assert_eq!(remaining.sections.len(), 1);
        assert_eq!(remaining.sections[0].name.as_deref(), Some("lan"));
    }

    #[test]
    fn merge_tree_restores_already_committed_packages_when_a_later_commit_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut uhttpd_pkg = Package::new("uhttpd");
        uhttpd_pkg.push(Section::new(Some("main".into()), "cfg01", "uhttpd"));
        let store = MemoryConfigStore::new().seed(network_package()).seed(uhttpd_pkg);
        store.fail_commit("uhttpd");
        let init = FakeInitSystem::new();
        let clock = FakeClock::default();
        let resolver = StaticResolver;

        let options = OrchestratorOptions {
            lock_path: dir.path().join("tx.lock"),
            ..Default::default()
        };
        let orchestrator = Orchestrator::new(&store, &init, &clock, &resolver, options);

        let mut incoming = BTreeMap::new();
        let mut network_incoming = Package::new("network");
        let mut s = Section::new(Some("lan".into()), "cfg01", "interface");
        s.options.insert("mtu".into(), "1500".into());
        network_incoming.push(s);
        incoming.insert("network".to_string(), network_incoming);

        let mut uhttpd_incoming = Package::new("uhttpd");
        let mut main_section = Section::new(Some("main".into()), "cfg01", "uhttpd");
        main_section.options.insert("listen_http".into(), "80".into());
        uhttpd_incoming.push(main_section);
        incoming.insert("uhttpd".to_string(), uhttpd_incoming);

        let result = orchestrator.merge_tree(&incoming);
        assert!(matches!(result, Err(OrchestratorError::CommitAborted { .. })));

        // network was committed first (it sorts before "uhttpd" in the
        // BTreeMap), then uhttpd's commit failed; the snapshot restore must
        // have put network back to its pre-image.
        let network_after = store.load("network").unwrap();
        assert!(network_after.sections[0].options.get("mtu").is_none());
    }

    #[test]
    fn merge_tree_commits_in_topological_order_even_against_alphabetical_order() {
        // "dhcp" maps to the dnsmasq service and "network" maps to the
        // network service; the dependency graph requires network before
        // dnsmasq, the opposite of "dhcp" < "network" alphabetically. If the
        // commit loop fell back to BTreeMap order this would commit dhcp
        // before network.
        let dir = tempfile::tempdir().unwrap();
        let mut dhcp_pkg = Package::new("dhcp");
        dhcp_pkg.push(Section::new(Some("lan".into()), "cfg01", "dhcp"));
        let store = MemoryConfigStore::new().seed(network_package()).seed(dhcp_pkg);
        let init = FakeInitSystem::new();
        let clock = FakeClock::default();
        let resolver = StaticResolver;

        let options = OrchestratorOptions {
            lock_path: dir.path().join("tx.lock"),
            ..Default::default()
        };
        let orchestrator = Orchestrator::new(&store, &init, &clock, &resolver, options);

        let mut incoming = BTreeMap::new();
        let mut network_incoming = Package::new("network");
        let mut s = Section::new(Some("lan".into()), "cfg01", "interface");
        s.options.insert("mtu".into(), "1500".into());
        network_incoming.push(s);
        incoming.insert("network".to_string(), network_incoming);

        let mut dhcp_incoming = Package::new("dhcp");
        let mut dhcp_section = Section::new(Some("lan".into()), "cfg01", "dhcp");
        dhcp_section.options.insert("leasetime".into(), "12h".into());
        dhcp_incoming.push(dhcp_section);
        incoming.insert("dhcp".to_string(), dhcp_incoming);

        let report = orchestrator.merge_tree(&incoming).unwrap();
        assert!(report.is_clean());

        let log = store.commit_log();
        let network_pos = log.iter().position(|p| p == "network").unwrap();
        let dhcp_pos = log.iter().position(|p| p == "dhcp").unwrap();
        assert!(network_pos < dhcp_pos, "expected network committed before dhcp, got {log:?}");
    }

    #[test]
    fn merge_tree_reverts_config_when_deadline_exceeded() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryConfigStore::new().seed(network_package());
        let init = FakeInitSystem::new();
        let clock = FakeClock::default();
        let resolver = StaticResolver;

        let options = OrchestratorOptions {
            lock_path: dir.path().join("tx.lock"),
            transaction_deadline: std::time::Duration::ZERO,
            ..Default::default()
        };
        let orchestrator = Orchestrator::new(&store, &init, &clock, &resolver, options);

        let mut incoming = BTreeMap::new();
        let mut incoming_pkg = Package::new("network");
        let mut s = Section::new(Some("lan".into()), "cfg01", "interface");
        s.options.insert("mtu".into(), "1500".into());
        incoming_pkg.push(s);
        incoming.insert("network".to_string(), incoming_pkg);

        let result = orchestrator.merge_tree(&incoming);
        assert!(matches!(result, Err(OrchestratorError::DeadlineExceeded { .. })));

        // the package was committed before the restart phase began, then the
        // zero-duration deadline tripped on the first service; the revert
        // must have restored network's pre-merge configuration.
        let reverted = store.load("network").unwrap();
        assert!(reverted.sections[0].options.get("mtu").is_none());
    }

    #[test]
    fn remove_matching_reverts_config_when_deadline_exceeded() {
        let dir = tempfile::tempdir().unwrap();
        let mut pkg = Package::new("network");
        pkg.push(Section::new(Some("lan".into()), "cfg01", "interface"));
        pkg.push(Section::new(Some("wan".into()), "cfg02", "interface"));
        let store = MemoryConfigStore::new().seed(pkg);
        let init = FakeInitSystem::new();
        let clock = FakeClock::default();
        let resolver = StaticResolver;

        let options = OrchestratorOptions {
            lock_path: dir.path().join("tx.lock"),
            transaction_deadline: std::time::Duration::ZERO,
            ..Default::default()
        };
        let orchestrator = Orchestrator::new(&store, &init, &clock, &resolver, options);

        let mut targets = BTreeMap::new();
        targets.insert("network".to_string(), vec![SectionRef::Named("wan".into())]);

        let result = orchestrator.remove_matching(&targets);
        assert!(matches!(result, Err(OrchestratorError::DeadlineExceeded { .. })));

        let reverted = store.load("network").unwrap();
        assert_eq!(reverted.sections.len(), 2);
    }
}
