//! Advisory file locking for the package cache.
//!
//! Each cache tier (and each package within it) can be locked independently
//! so that two dub processes never extract or prune the same path at once.
//! The lock is released automatically when the [`TierLock`] is dropped.

use std::{
    fs::{self, File, OpenOptions},
    path::{Path, PathBuf},
    thread,
    time::{Duration, Instant},
};

use crate::error::{LockError, LockResult};

pub struct TierLock {
    _file: nix::fcntl::Flock<File>,
    path: PathBuf,
}

impl TierLock {
    fn lock_path_for(root: &Path, key: &str) -> LockResult<PathBuf> {
        if !root.exists() {
            fs::create_dir_all(root).map_err(|source| {
                LockError::FileSystem(crate::error::FileSystemError::CreateDirectory {
                    path: root.to_path_buf(),
                    source,
                })
            })?;
        }

        let sanitized: String = key
            .chars()
            .map(|c| if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
            .collect();

        Ok(root.join(format!("{sanitized}.lock")))
    }

    /// Blocks until an exclusive lock on `key` under `root` can be acquired.
    pub fn acquire(root: &Path, key: &str) -> LockResult<Self> {
        let lock_path = Self::lock_path_for(root, key)?;
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|source| {
                LockError::FileSystem(crate::error::FileSystemError::CreateFile {
                    path: lock_path.clone(),
                    source,
                })
            })?;

        let file = nix::fcntl::Flock::lock(file, nix::fcntl::FlockArg::LockExclusive)
            .map_err(|(_, err)| {
                LockError::AcquireFailed(format!("{}: {}", lock_path.display(), err))
            })?;

        Ok(TierLock { path: lock_path, _file: file })
    }

    /// Attempts to acquire the lock, retrying until `timeout` elapses.
    /// Returns [`LockError::Timeout`] if the lock is never freed in time.
    pub fn acquire_with_timeout(root: &Path, key: &str, timeout: Duration) -> LockResult<Self> {
        let lock_path = Self::lock_path_for(root, key)?;
        let deadline = Instant::now() + timeout;

        loop {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(false)
                .open(&lock_path)
                .map_err(|source| {
                    LockError::FileSystem(crate::error::FileSystemError::CreateFile {
                        path: lock_path.clone(),
                        source,
                    })
                })?;

            match nix::fcntl::Flock::lock(file, nix::fcntl::FlockArg::LockExclusiveNonblock) {
                Ok(file) => return Ok(TierLock { path: lock_path, _file: file }),
                Err((_, nix::errno::Errno::EWOULDBLOCK)) => {
                    if Instant::now() >= deadline {
                        return Err(LockError::Timeout {
                            path: lock_path,
                            timeout_secs: timeout.as_secs(),
                        });
                    }
                    thread::sleep(Duration::from_millis(50));
                }
                Err((_, err)) => {
                    return Err(LockError::AcquireFailed(format!(
                        "{}: {}",
                        lock_path.display(),
                        err
                    )))
                }
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use std::{thread, time::Duration};

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn acquires_and_releases_lock() {
        let root = tempdir().unwrap();
        let lock1 = TierLock::acquire(root.path(), "left-pad").unwrap();
        let timed_out = TierLock::acquire_with_timeout(root.path(), "left-pad", Duration::from_millis(50));
        assert!(timed_out.is_err());
        drop(lock1);

        let lock2 = TierLock::acquire_with_timeout(root.path(), "left-pad", Duration::from_millis(50));
        assert!(lock2.is_ok());
    }

    #[test]
    fn different_keys_do_not_contend() {
        let root = tempdir().unwrap();
        let a = TierLock::acquire(root.path(), "pkg-a").unwrap();
        let b = TierLock::acquire(root.path(), "pkg-b").unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn blocking_acquire_waits_for_release() {
        let root = tempdir().unwrap();
        let lock1 = TierLock::acquire(root.path(), "blocked").unwrap();
        let root_path = root.path().to_path_buf();

        let handle = thread::spawn(move || {
            TierLock::acquire(&root_path, "blocked").unwrap();
        });

        thread::sleep(Duration::from_millis(100));
        drop(lock1);
        handle.join().unwrap();
    }
}
