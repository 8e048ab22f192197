//! Materializes a staging plan as symbolic links.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::core::links::{StageAction, StagePlan};

#[cfg(unix)]
use std::os::unix::fs::symlink;
#[cfg(windows)]
use std::os::windows::fs::symlink_file as symlink;

/// Apply `plan`, creating every planned link in order.
pub fn apply(plan: &StagePlan) -> Result<()> {
    for action in &plan.actions {
        match action {
            StageAction::Link { source, dest } => replace_symlink(source, dest)?,
            StageAction::Keep { dest } => {
                debug!(dest = %dest.display(), "already in place");
            }
        }
    }
    Ok(())
}

/// Create a symlink at `dest` pointing to `source`, replacing any existing
/// entry. Probes with `symlink_metadata` so dangling links are replaced too.
pub fn replace_symlink(source: &Path, dest: &Path) -> Result<()> {
    if fs::symlink_metadata(dest).is_ok() {
        fs::remove_file(dest).with_context(|| format!("remove existing {}", dest.display()))?;
    }
    symlink(source, dest)
        .with_context(|| format!("link {} -> {}", dest.display(), source.display()))?;
    debug!(dest = %dest.display(), source = %source.display(), "staged link");
    Ok(())
}
