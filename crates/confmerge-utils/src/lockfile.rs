use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::error::{LockError, UtilError};
use crate::Result;

/// RAII lock file guard. Creates a `.lock` file on construction,
/// atomically renames on commit, removes on drop if not committed.
///
/// Used by the orchestrator to take the exclusive configuration lock
/// required by spec §4.5 step 2, and by the config store to guard an
/// individual package file during commit.
pub struct LockFile {
    path: PathBuf,
    lock_path: PathBuf,
    file: Option<File>,
    committed: bool,
}

const LOCK_SUFFIX: &str = ".lock";

impl LockFile {
    /// Acquire a lock on the given path. Creates `path.lock` using O_CREAT|O_EXCL.
    ///
    /// Returns an error if the lock file already exists (another process holds the lock)
    /// or if the file cannot be created.
    pub fn acquire(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let lock_path = PathBuf::from(format!("{}{}", path.display(), LOCK_SUFFIX));

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
            .map_err(|e| {
                if e.kind() == io::ErrorKind::AlreadyExists {
                    UtilError::Lock(LockError::AlreadyLocked {
                        path: lock_path.clone(),
                    })
                } else {
                    UtilError::Lock(LockError::Create {
                        path: lock_path.clone(),
                        source: e,
                    })
                }
            })?;

        Ok(Self {
            path,
            lock_path,
            file: Some(file),
            committed: false,
        })
    }

    /// Try to acquire without blocking. Returns Ok(None) if already locked,
    /// Ok(Some(lockfile)) on success, or Err on other failures.
    pub fn try_acquire(path: impl AsRef<Path>) -> Result<Option<Self>> {
        match Self::acquire(path) {
            Ok(lk) => Ok(Some(lk)),
            Err(UtilError::Lock(LockError::AlreadyLocked { .. })) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Non-blocking acquisition with a bounded retry window: polls at a short
    /// interval until either the lock is free or `timeout` elapses. Never
    /// blocks past `timeout` — conflicting transactions fail fast rather than
    /// waiting indefinitely, per spec §4.5's concurrency guard.
    pub fn acquire_with_timeout(path: impl AsRef<Path>, timeout: Duration) -> Result<Self> {
        let path = path.as_ref();
        let start = Instant::now();
        loop {
            match Self::try_acquire(path)? {
                Some(lock) => return Ok(lock),
                None => {
                    if start.elapsed() >= timeout {
                        let lock_path = PathBuf::from(format!("{}{}", path.display(), LOCK_SUFFIX));
                        return Err(UtilError::Lock(LockError::Timeout {
                            path: lock_path,
                            waited_ms: start.elapsed().as_millis(),
                        }));
                    }
                    std::thread::sleep(Duration::from_millis(10));
                }
            }
        }
    }

    pub fn file_mut(&mut self) -> Option<&mut File> {
        self.file.as_mut()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    /// Commit: close the file and atomically rename .lock to target.
    pub fn commit(mut self) -> Result<()> {
        if let Some(ref mut file) = self.file {
            file.flush().map_err(|e| {
                UtilError::Lock(LockError::Commit {
                    path: self.lock_path.clone(),
                    source: e,
                })
            })?;
            file.sync_all().map_err(|e| {
                UtilError::Lock(LockError::Commit {
                    path: self.lock_path.clone(),
                    source: e,
                })
            })?;
        }
        self.file.take();

        fs::rename(&self.lock_path, &self.path).map_err(|e| {
            UtilError::Lock(LockError::Commit {
                path: self.lock_path.clone(),
                source: e,
            })
        })?;

        self.committed = true;
        Ok(())
    }

    /// Rollback: remove .lock file (also happens on Drop).
    pub fn rollback(mut self) -> Result<()> {
        self.file.take();
        if self.lock_path.exists() {
            fs::remove_file(&self.lock_path)?;
        }
        self.committed = true;
        Ok(())
    }
}

impl Write for LockFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::other("lock file already closed"))?
            .write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::other("lock file already closed"))?
            .flush()
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        if !self.committed {
            self.file.take();
            let _ = fs::remove_file(&self.lock_path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_and_commit() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("network.conf");
        fs::write(&target, b"old content").unwrap();

        let mut lock = LockFile::acquire(&target).unwrap();
        assert!(lock.lock_path().exists());
        lock.write_all(b"new content").unwrap();
        lock.commit().unwrap();

        assert!(!dir.path().join("network.conf.lock").exists());
        assert_eq!(fs::read_to_string(&target).unwrap(), "new content");
    }

    #[test]
    fn acquire_and_rollback() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("network.conf");
        fs::write(&target, b"original").unwrap();

        {
            let mut lock = LockFile::acquire(&target).unwrap();
            lock.write_all(b"should not persist").unwrap();
            lock.rollback().unwrap();
        }

        assert_eq!(fs::read_to_string(&target).unwrap(), "original");
        assert!(!dir.path().join("network.conf.lock").exists());
    }

    #[test]
    fn drop_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("network.conf");
        fs::write(&target, b"original").unwrap();

        {
            let mut lock = LockFile::acquire(&target).unwrap();
            lock.write_all(b"dropped content").unwrap();
        }

        assert!(!dir.path().join("network.conf.lock").exists());
        assert_eq!(fs::read_to_string(&target).unwrap(), "original");
    }

    #[test]
    fn double_lock_fails() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("network.conf");
        fs::write(&target, b"content").unwrap();

        let _lock1 = LockFile::acquire(&target).unwrap();
        match LockFile::acquire(&target) {
            Err(UtilError::Lock(LockError::AlreadyLocked { .. })) => {}
            other => panic!("expected AlreadyLocked, got {other:?}"),
        }
    }

    #[test]
    fn acquire_with_timeout_fails_fast_when_held() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("network.conf");
        fs::write(&target, b"content").unwrap();

        let _lock1 = LockFile::acquire(&target).unwrap();
        let start = Instant::now();
        let result = LockFile::acquire_with_timeout(&target, Duration::from_millis(50));
        assert!(result.is_err());
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn acquire_with_timeout_succeeds_once_free() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("network.conf");
        fs::write(&target, b"content").unwrap();

        let lock = LockFile::acquire_with_timeout(&target, Duration::from_millis(50)).unwrap();
        lock.rollback().unwrap();
    }
}
