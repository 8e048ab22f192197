//! Pre-execution check that every required input is in the run directory.

use std::path::Path;

use anyhow::Result;
use tracing::debug;

use crate::core::links::{LINE_LIST, MODEL_INPUT, MODEL_TABLE, RUN_CONFIG, expand};
use crate::error::SynspecError;

/// Inputs the program reads, in the order they are checked.
pub const REQUIRED_INPUTS: [&str; 4] = [LINE_LIST, RUN_CONFIG, MODEL_INPUT, MODEL_TABLE];

/// Fail with [`SynspecError::MissingInputFile`] naming the first required
/// input absent from `run_dir`.
///
/// Present means a regular file, or a symlink resolving to one; contents are
/// not inspected.
pub fn check_inputs(model: &str, run_dir: &Path) -> Result<()> {
    for template in REQUIRED_INPUTS {
        let name = expand(template, model);
        let path = run_dir.join(&name);
        let present = path.metadata().map(|meta| meta.is_file()).unwrap_or(false);
        if !present {
            return Err(SynspecError::MissingInputFile {
                name,
                dir: run_dir.to_path_buf(),
            }
            .into());
        }
    }
    debug!(dir = %run_dir.display(), "all required inputs present");
    Ok(())
}
