use std::io::Write;
use std::path::{Path, PathBuf};

use confmerge_model::{Package, SectionRef};
use confmerge_utils::lockfile::LockFile;

use crate::error::ConfigStoreError;
use crate::store::ConfigStore;

/// A disk-backed config store: one file per package under `root`.
///
/// The real on-disk package format (the host system's own
/// parser/serializer) is out of scope for this engine — it is treated as
/// a black box elsewhere. This implementation stands in for that black
/// box with a direct structured encoding of [`Package`] so the
/// transactional commit/rollback path has a genuine filesystem backend to
/// exercise, atomically, via the same lock-file protocol the teacher's
/// config file writer uses.
pub struct FileConfigStore {
    root: PathBuf,
}

impl FileConfigStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, package: &str) -> PathBuf {
        self.root.join(format!("{package}.pkg"))
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self, package: &str) -> Result<Package, ConfigStoreError> {
        let path = self.path_for(package);
        let content = std::fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigStoreError::PackageNotFound(package.to_string())
            } else {
                ConfigStoreError::Io(e)
            }
        })?;
        serde_json::from_slice(&content).map_err(|e| ConfigStoreError::Parse {
            package: package.to_string(),
            detail: e.to_string(),
        })
    }

    fn list_packages(&self) -> Result<Vec<String>, ConfigStoreError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("pkg") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn commit(&self, package: &str, tree: &Package) -> Result<(), ConfigStoreError> {
        std::fs::create_dir_all(&self.root)?;
        let path = self.path_for(package);
        let content = serde_json::to_vec_pretty(tree).map_err(|e| ConfigStoreError::Parse {
            package: package.to_string(),
            detail: e.to_string(),
        })?;

        let mut lock = LockFile::acquire(&path)
            .map_err(|e| ConfigStoreError::CommitFailed(package.to_string(), e))?;
        lock.write_all(&content)
            .map_err(confmerge_utils::UtilError::Io)
            .map_err(|e| ConfigStoreError::CommitFailed(package.to_string(), e))?;
        lock.commit()
            .map_err(|e| ConfigStoreError::CommitFailed(package.to_string(), e))?;
        Ok(())
    }

    fn delete_section(&self, package: &str, section: &SectionRef) -> Result<(), ConfigStoreError> {
        let mut tree = self.load(package)?;
        let idx = tree
            .find(section)
            .ok_or_else(|| ConfigStoreError::SectionNotFound(section.to_string()))?;
        tree.sections.remove(idx);
        self.commit(package, &tree)
    }
}

impl FileConfigStore {
    pub fn root(&self) -> &Path {
        &self.root
    }
}
