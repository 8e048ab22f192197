//! Advisory locking of run directories.
//!
//! A lock is a token file inside the directory it guards. Acquisition uses
//! the filesystem's atomic create-new, so contention over a live lock is
//! race-free. A lock file older than the staleness threshold is presumed
//! abandoned by a crashed run and reclaimed with a write-then-read-back
//! handshake; that path tolerates a small check-then-act window, which is
//! acceptable for crash recovery.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use rand::{Rng, distributions::Alphanumeric};
use tracing::{debug, warn};

use crate::error::SynspecError;

/// Tunables for [`DirLock`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockOptions {
    /// File name created inside the locked directory.
    pub file_name: String,
    /// Age beyond which an existing lock file is presumed abandoned.
    pub stale_after: Duration,
    /// Check at release time that the lock file still holds our token.
    pub verify_on_release: bool,
}

impl Default for LockOptions {
    fn default() -> Self {
        Self {
            file_name: "synspec.lock".to_string(),
            stale_after: Duration::from_secs(60),
            verify_on_release: true,
        }
    }
}

/// Exclusive advisory lock on a directory, held from acquisition to release.
///
/// Dropping a held lock deletes the lock file best-effort; call
/// [`DirLock::release`] on the success path so verification failures surface.
#[derive(Debug)]
pub struct DirLock {
    dir: PathBuf,
    path: PathBuf,
    token: String,
    verify_on_release: bool,
    released: bool,
}

impl DirLock {
    /// Acquire the lock for `dir`.
    ///
    /// Fails with [`SynspecError::LockBusy`] when another run holds a fresh
    /// lock, or when another contender wins a stale-lock reclaim race.
    pub fn acquire(dir: &Path, options: &LockOptions) -> Result<Self> {
        let path = dir.join(&options.file_name);
        let token = new_token();
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(token.as_bytes())
                    .with_context(|| format!("write lock file {}", path.display()))?;
                file.sync_all()
                    .with_context(|| format!("sync lock file {}", path.display()))?;
                debug!(lock = %path.display(), "acquired directory lock");
            }
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                reclaim_stale(dir, &path, &token, options)?;
            }
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("create lock file {}", path.display()));
            }
        }
        Ok(Self {
            dir: dir.to_path_buf(),
            path,
            token,
            verify_on_release: options.verify_on_release,
            released: false,
        })
    }

    /// Directory this lock guards.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the lock, deleting the lock file.
    ///
    /// With `verify_on_release`, a missing or foreign token fails with
    /// [`SynspecError::LockCorrupted`]: the directory contents can no longer
    /// be trusted to come from this run alone. The lock file is removed
    /// either way.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        let verification = if self.verify_on_release {
            self.verify_token()
        } else {
            Ok(())
        };
        let removal = fs::remove_file(&self.path)
            .with_context(|| format!("remove lock file {}", self.path.display()));
        match verification {
            Ok(()) => removal,
            Err(err) => {
                if let Err(removal_err) = removal {
                    debug!(error = %removal_err, "lock file removal after corruption");
                }
                Err(err)
            }
        }
    }

    fn verify_token(&self) -> Result<()> {
        match fs::read_to_string(&self.path) {
            Ok(contents) if contents == self.token => Ok(()),
            Ok(contents) => Err(SynspecError::LockCorrupted {
                lock: self.path.clone(),
                reason: format!("token changed to {contents:?}"),
            }
            .into()),
            Err(err) => Err(SynspecError::LockCorrupted {
                lock: self.path.clone(),
                reason: format!("lock file unreadable: {err}"),
            }
            .into()),
        }
    }
}

impl Drop for DirLock {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(err) = fs::remove_file(&self.path) {
            warn!(lock = %self.path.display(), error = %err, "failed to remove lock file on drop");
        }
    }
}

fn reclaim_stale(dir: &Path, path: &Path, token: &str, options: &LockOptions) -> Result<()> {
    match lock_age(path) {
        Some(age) if age < options.stale_after => {
            return Err(SynspecError::LockBusy {
                dir: dir.to_path_buf(),
            }
            .into());
        }
        Some(age) => {
            warn!(lock = %path.display(), age_secs = age.as_secs(), "reclaiming stale lock");
        }
        // The holder released between our create attempt and the stat.
        None => debug!(lock = %path.display(), "lock file vanished, taking over"),
    }
    // Overwrite and read back; a concurrent reclaimer can win, the read-back
    // decides.
    fs::write(path, token).with_context(|| format!("overwrite stale lock {}", path.display()))?;
    let read_back = fs::read_to_string(path)
        .with_context(|| format!("read back lock file {}", path.display()))?;
    if read_back != token {
        return Err(SynspecError::LockBusy {
            dir: dir.to_path_buf(),
        }
        .into());
    }
    Ok(())
}

fn lock_age(path: &Path) -> Option<Duration> {
    let modified = fs::metadata(path).ok()?.modified().ok()?;
    Some(
        SystemTime::now()
            .duration_since(modified)
            .unwrap_or_default(),
    )
}

fn new_token() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = std::iter::repeat_with(|| rng.sample(Alphanumeric))
        .map(char::from)
        .take(8)
        .collect();
    format!("{}-{suffix}", std::process::id())
}
