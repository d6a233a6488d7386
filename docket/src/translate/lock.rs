//! File-based mutual exclusion for the one-time glossary installation.
//!
//! Workers in separate processes may race to install the same package. The
//! lock is an exclusively created file; it is removed when the guard drops.

use crate::error::{DocketError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant, SystemTime};

/// Contents of the lock file.
#[derive(Debug, Serialize, Deserialize)]
struct LockInfo {
    pid: u32,
    acquired_at: DateTime<Utc>,
}

/// Held install lock. Dropping it releases the lock.
#[derive(Debug)]
pub struct InstallLock {
    path: PathBuf,
}

/// How long to wait and when to give up on another holder.
#[derive(Debug, Clone, Copy)]
pub struct LockPolicy {
    pub timeout: Duration,
    pub poll: Duration,
    pub stale_after: Duration,
}

impl InstallLock {
    /// Block until the lock at `path` is ours, polling every `policy.poll`.
    ///
    /// A lock older than `policy.stale_after` is assumed abandoned and broken.
    pub fn acquire(path: &Path, policy: LockPolicy) -> Result<Self> {
        let started = Instant::now();
        loop {
            if let Some(lock) = Self::try_create(path, write_owner)? {
                log::debug!("Acquired install lock {}", path.display());
                return Ok(lock);
            }

            if is_stale(path, policy.stale_after) {
                log::warn!("Breaking stale install lock {}", path.display());
                match fs::remove_file(path) {
                    Ok(()) => continue,
                    Err(e) if e.kind() == ErrorKind::NotFound => continue,
                    Err(e) => return Err(e.into()),
                }
            }

            if started.elapsed() >= policy.timeout {
                return Err(DocketError::LockTimeout {
                    path: path.to_path_buf(),
                    waited_secs: started.elapsed().as_secs(),
                });
            }

            log::debug!("Waiting for install lock {}", path.display());
            thread::sleep(policy.poll);
        }
    }

    /// `None` when another holder owns the file. The guard exists before the
    /// owner record is written, so a failed write still removes the file.
    fn try_create(
        path: &Path,
        record: impl FnOnce(&mut File) -> Result<()>,
    ) -> Result<Option<Self>> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let lock = Self {
            path: path.to_path_buf(),
        };
        let written = record(&mut file);
        drop(file);
        written?;
        Ok(Some(lock))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstallLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            log::warn!("Failed to release install lock {}: {}", self.path.display(), e);
        } else {
            log::debug!("Released install lock {}", self.path.display());
        }
    }
}

fn write_owner(file: &mut File) -> Result<()> {
    let info = LockInfo {
        pid: std::process::id(),
        acquired_at: Utc::now(),
    };
    file.write_all(serde_json::to_string(&info)?.as_bytes())?;
    Ok(())
}

/// Age of the lock from its recorded timestamp, or from the file's mtime when
/// the body is unreadable (a holder may be mid-write).
fn lock_age(path: &Path) -> Option<Duration> {
    let recorded = fs::read_to_string(path)
        .ok()
        .and_then(|body| serde_json::from_str::<LockInfo>(&body).ok())
        .and_then(|info| (Utc::now() - info.acquired_at).to_std().ok());
    if recorded.is_some() {
        return recorded;
    }
    fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|modified| SystemTime::now().duration_since(modified).ok())
}

fn is_stale(path: &Path, stale_after: Duration) -> bool {
    lock_age(path).is_some_and(|age| age > stale_after)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn policy(timeout_ms: u64) -> LockPolicy {
        LockPolicy {
            timeout: Duration::from_millis(timeout_ms),
            poll: Duration::from_millis(10),
            stale_after: Duration::from_secs(60),
        }
    }

    #[test]
    fn test_acquire_and_release() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("install.lock");

        let lock = InstallLock::acquire(&path, policy(100)).unwrap();
        assert!(path.exists());
        let body = fs::read_to_string(lock.path()).unwrap();
        let info: LockInfo = serde_json::from_str(&body).unwrap();
        assert_eq!(info.pid, std::process::id());

        drop(lock);
        assert!(!path.exists());
    }

    #[test]
    fn test_second_holder_times_out() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("install.lock");

        let _held = InstallLock::acquire(&path, policy(100)).unwrap();
        let err = InstallLock::acquire(&path, policy(50)).unwrap_err();
        assert!(matches!(err, DocketError::LockTimeout { .. }));
        // The holder's lock is untouched
        assert!(path.exists());
    }

    #[test]
    fn test_stale_lock_is_broken() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("install.lock");
        let old = LockInfo {
            pid: 1,
            acquired_at: Utc::now() - chrono::Duration::seconds(3600),
        };
        fs::write(&path, serde_json::to_string(&old).unwrap()).unwrap();

        let lock = InstallLock::acquire(&path, policy(100)).unwrap();
        let info: LockInfo = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(info.pid, std::process::id());
        drop(lock);
    }

    #[test]
    fn test_failed_owner_write_removes_lock_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("install.lock");

        let result = InstallLock::try_create(&path, |_| {
            Err(std::io::Error::other("disk full").into())
        });
        assert!(matches!(result, Err(DocketError::Io(_))));
        assert!(!path.exists());

        // Nobody has to wait out the stale timeout
        assert!(InstallLock::acquire(&path, policy(100)).is_ok());
    }

    #[test]
    fn test_released_lock_can_be_reacquired() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("install.lock");

        drop(InstallLock::acquire(&path, policy(100)).unwrap());
        let again = InstallLock::acquire(&path, policy(100));
        assert!(again.is_ok());
    }
}
