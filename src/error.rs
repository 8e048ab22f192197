//! Typed failures for the synthesis pipeline.
//!
//! Filesystem and process errors propagate as [`anyhow::Error`]s with context.
//! The conditions callers are expected to branch on (lock contention, missing
//! files, a failed synthesis) are raised as [`SynspecError`] values; `anyhow`
//! keeps them downcastable through any context added above them.

use std::path::PathBuf;

use thiserror::Error;

/// Failures with a defined meaning for callers.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SynspecError {
    /// The requested program version is not one this wrapper can drive.
    #[error("unsupported synspec version {0} (only version 51 is supported)")]
    UnsupportedVersion(u32),

    /// Another run holds a fresh lock on the directory.
    #[error("run directory {dir:?} is locked by another run")]
    LockBusy {
        /// Directory whose lock is held elsewhere.
        dir: PathBuf,
    },

    /// The lock file vanished or changed hands while we believed we held it.
    #[error("lock file {lock:?} no longer holds our token: {reason}")]
    LockCorrupted {
        /// Lock file that failed verification.
        lock: PathBuf,
        /// What the verification found.
        reason: String,
    },

    /// A staged link whose destination would point back at its own source.
    #[error("link {dest} would resolve to its own source {path:?}")]
    InvalidLink {
        /// Destination name after placeholder substitution.
        dest: String,
        /// The coincident path.
        path: PathBuf,
    },

    /// A required input file is absent from the run directory.
    #[error("required input {name} missing from run directory {dir:?}")]
    MissingInputFile {
        /// File name after placeholder substitution.
        name: String,
        /// Run directory that was checked.
        dir: PathBuf,
    },

    /// The external program exited unsuccessfully.
    #[error("synspec failed with exit status {code:?} (see {log:?})")]
    ExternalProcessFailed {
        /// Exit code, `None` when the process was killed by a signal.
        code: Option<i32>,
        /// Captured stdout/stderr of the failed run.
        log: PathBuf,
    },

    /// The program exited successfully but an expected output never appeared.
    #[error("expected output {name} missing from run directory {dir:?}")]
    MissingOutputFile {
        /// Output unit that was expected.
        name: String,
        /// Run directory that was checked.
        dir: PathBuf,
    },
}
