//! Cross-process advisory lock held around opening a database file.
//!
//! The lock lives next to the database as `<db path>.lock`. On unix it is an
//! exclusive `flock`; elsewhere the lock file itself is the token.

use crate::error::{Result, StoreError};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::Duration;

const BACKOFF_START_MS: u64 = 10;
const BACKOFF_CAP_MS: u64 = 500;

#[derive(Debug)]
pub struct ProfileLock {
    path: PathBuf,
    #[cfg(unix)]
    _held: nix::fcntl::Flock<File>,
    #[cfg(not(unix))]
    _held: File,
}

pub fn lock_path(db_path: &Path) -> PathBuf {
    let mut path = db_path.as_os_str().to_owned();
    path.push(".lock");
    PathBuf::from(path)
}

impl ProfileLock {
    /// Try once, then up to `retries` more times with bounded exponential
    /// backoff.
    pub fn acquire(db_path: &Path, retries: u32) -> Result<Self> {
        let path = lock_path(db_path);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        for attempt in 0..=retries {
            if let Some(held) = try_lock(&path)? {
                tracing::trace!("Locked {}", path.display());
                return Ok(Self { path, _held: held });
            }
            if attempt < retries {
                let exp = attempt.min(16);
                let delay = (BACKOFF_START_MS << exp).min(BACKOFF_CAP_MS);
                std::thread::sleep(Duration::from_millis(delay));
            }
        }
        Err(StoreError::Lock { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(unix)]
fn try_lock(path: &Path) -> Result<Option<nix::fcntl::Flock<File>>> {
    use nix::errno::Errno;
    use nix::fcntl::{Flock, FlockArg};

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)?;
    match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
        Ok(held) => Ok(Some(held)),
        Err((_, Errno::EWOULDBLOCK)) => Ok(None),
        Err((_, errno)) => Err(std::io::Error::from(errno).into()),
    }
}

#[cfg(not(unix))]
fn try_lock(path: &Path) -> Result<Option<File>> {
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => Ok(Some(file)),
        Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => Ok(None),
        Err(err) => Err(err.into()),
    }
}

#[cfg(not(unix))]
impl Drop for ProfileLock {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_file(&self.path) {
            tracing::warn!("Could not remove {}: {}", self.path.display(), err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_path_appends_suffix() {
        let path = lock_path(Path::new("/profile/history.db"));
        assert_eq!(path, PathBuf::from("/profile/history.db.lock"));
    }

    #[test]
    fn test_second_holder_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("colors.db");
        let first = ProfileLock::acquire(&db, 0).unwrap();
        assert!(matches!(
            ProfileLock::acquire(&db, 1),
            Err(StoreError::Lock { .. })
        ));
        drop(first);
        assert!(ProfileLock::acquire(&db, 0).is_ok());
    }
}
