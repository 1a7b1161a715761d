use std::collections::BTreeMap;
use std::sync::Mutex;

use confmerge_model::{Package, SectionRef};

use crate::error::ConfigStoreError;
use crate::store::ConfigStore;

/// In-memory config store used by tests for both the merge engine and the
/// orchestrator: no real filesystem, no real package parser, just the
/// trait's contract. This is the `FakeConfigStore` the rest of the
/// workspace's test suites build on (the teacher's tests substitute an
/// in-memory `Repository`-adjacent fake the same way rather than touching
/// `.git` on disk).
#[derive(Default)]
pub struct MemoryConfigStore {
    packages: Mutex<BTreeMap<String, Package>>,
    /// Package names whose next `commit` call should fail, simulating a
    /// durability failure in the real store. Used by orchestrator tests to
    /// exercise the partial-commit-failure/snapshot-restore path.
    fail_commit: Mutex<std::collections::HashSet<String>>,
    /// Successful `commit` calls in call order, so tests can assert on
    /// commit ordering rather than just the final committed state.
    commit_log: Mutex<Vec<String>>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(self, package: Package) -> Self {
        self.packages.lock().unwrap().insert(package.name.clone(), package);
        self
    }

    /// Make the next (and every subsequent) `commit` of `package` fail.
    pub fn fail_commit(&self, package: &str) {
        self.fail_commit.lock().unwrap().insert(package.to_string());
    }

    /// Package names in the order they were successfully committed.
    pub fn commit_log(&self) -> Vec<String> {
        self.commit_log.lock().unwrap().clone()
    }
}

impl ConfigStore for MemoryConfigStore {
    fn load(&self, package: &str) -> Result<Package, ConfigStoreError> {
        self.packages
            .lock()
            .unwrap()
            .get(package)
            .cloned()
            .ok_or_else(|| ConfigStoreError::PackageNotFound(package.to_string()))
    }

    fn list_packages(&self) -> Result<Vec<String>, ConfigStoreError> {
        Ok(self.packages.lock().unwrap().keys().cloned().collect())
    }

    fn commit(&self, package: &str, tree: &Package) -> Result<(), ConfigStoreError> {
        if self.fail_commit.lock().unwrap().contains(package) {
            return Err(ConfigStoreError::CommitFailed(
                package.to_string(),
                confmerge_utils::UtilError::Io(std::io::Error::new(std::io::ErrorKind::Other, "simulated commit failure")),
            ));
        }
        self.packages
            .lock()
            .unwrap()
            .insert(package.to_string(), tree.clone());
        self.commit_log.lock().unwrap().push(package.to_string());
        Ok(())
    }

    fn delete_section(&self, package: &str, section: &SectionRef) -> Result<(), ConfigStoreError> {
        let mut packages = self.packages.lock().unwrap();
        let pkg = packages
            .get_mut(package)
            .ok_or_else(|| ConfigStoreError::PackageNotFound(package.to_string()))?;
        let idx = pkg
            .find(section)
            .ok_or_else(|| ConfigStoreError::SectionNotFound(section.to_string()))?;
        pkg.sections.remove(idx);
        Ok(())
    }
}
