//! Resolution and lifetime of the directory a synthesis runs in.
//!
//! Persistent directories (current or explicit) are guarded by a [`DirLock`];
//! temporary directories are exclusive by construction and skip locking.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;
use tracing::debug;

use crate::io::lock::{DirLock, LockOptions};

/// Where a synthesis run should execute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RunDirSpec {
    /// Run in the invoking process's current directory.
    #[default]
    Current,
    /// Run in the given directory, created if absent.
    Explicit(PathBuf),
    /// Run in a private temporary directory deleted afterwards.
    Temporary,
}

/// A resolved run directory, locked or temporary, cleaned up on drop.
#[derive(Debug)]
pub struct RunDir {
    kind: RunDirKind,
}

#[derive(Debug)]
enum RunDirKind {
    Locked { dir: PathBuf, lock: DirLock },
    Temporary { temp: TempDir },
}

impl RunDir {
    /// Resolve `spec`, acquiring the directory lock for persistent
    /// directories.
    pub fn resolve(spec: &RunDirSpec, lock_options: &LockOptions) -> Result<Self> {
        match spec {
            RunDirSpec::Current => {
                let dir = env::current_dir().context("resolve current directory")?;
                Self::lock_dir(dir, lock_options)
            }
            RunDirSpec::Explicit(path) => {
                fs::create_dir_all(path)
                    .with_context(|| format!("create run directory {}", path.display()))?;
                let dir = path
                    .canonicalize()
                    .with_context(|| format!("canonicalize run directory {}", path.display()))?;
                Self::lock_dir(dir, lock_options)
            }
            RunDirSpec::Temporary => {
                let temp = tempfile::tempdir().context("create temporary run directory")?;
                debug!(dir = %temp.path().display(), "using temporary run directory");
                Ok(Self {
                    kind: RunDirKind::Temporary { temp },
                })
            }
        }
    }

    fn lock_dir(dir: PathBuf, lock_options: &LockOptions) -> Result<Self> {
        let lock = DirLock::acquire(&dir, lock_options)?;
        debug!(dir = %dir.display(), "locked run directory");
        Ok(Self {
            kind: RunDirKind::Locked { dir, lock },
        })
    }

    /// Directory the run executes in.
    pub fn path(&self) -> &Path {
        match &self.kind {
            RunDirKind::Locked { dir, .. } => dir,
            RunDirKind::Temporary { temp } => temp.path(),
        }
    }

    /// Tear down on the success path: release the lock or delete the
    /// temporary directory, surfacing errors. Dropping instead performs the
    /// same cleanup best-effort.
    pub fn finish(self) -> Result<()> {
        match self.kind {
            RunDirKind::Locked { lock, .. } => lock.release(),
            RunDirKind::Temporary { temp } => {
                temp.close().context("remove temporary run directory")
            }
        }
    }
}
