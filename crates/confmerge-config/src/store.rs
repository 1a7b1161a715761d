use confmerge_model::{Package, SectionRef};

use crate::error::ConfigStoreError;

/// The config-store adapter the orchestrator and merge engine depend on
/// (spec §6). The on-disk parser/serializer behind a real implementation
/// is explicitly out of scope for this engine — it is consumed as a black
/// box through this trait, the same way the teacher's `Repository` treats
/// its object database and ref store as injected subsystems rather than
/// reimplementing their wire formats inline.
pub trait ConfigStore {
    fn load(&self, package: &str) -> Result<Package, ConfigStoreError>;

    fn list_packages(&self) -> Result<Vec<String>, ConfigStoreError>;

    /// Atomically and durably replace `package`'s committed tree.
    fn commit(&self, package: &str, tree: &Package) -> Result<(), ConfigStoreError>;

    /// Remove a single section from a package's committed tree, matched by
    /// [`SectionRef`] (name, or type + ordinal for anonymous sections).
    fn delete_section(&self, package: &str, section: &SectionRef) -> Result<(), ConfigStoreError>;
}
