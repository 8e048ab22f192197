//! Collection of the program's fixed-name outputs.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::error::SynspecError;
use crate::io::program::LOG_FILE;

/// Output units and the extensions they are published under.
pub const OUTPUT_UNITS: [(&str, &str); 4] = [
    ("fort.7", "spec"),
    ("fort.12", "iden"),
    ("fort.16", "eqws"),
    ("fort.17", "cont"),
];

/// Copy every output unit plus the log from `run_dir` into `output_dir` as
/// `{base}.{extension}`, creating `output_dir` if absent.
///
/// Fails with [`SynspecError::MissingOutputFile`] on the first absent unit.
/// Already-copied files and the run directory are left as they are for
/// inspection.
pub fn extract_outputs(run_dir: &Path, output_dir: &Path, base: &str) -> Result<()> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("create output directory {}", output_dir.display()))?;
    for (unit, extension) in OUTPUT_UNITS {
        copy_output(run_dir, unit, output_dir, &format!("{base}.{extension}"))?;
    }
    copy_output(run_dir, LOG_FILE, output_dir, &format!("{base}.log"))?;
    debug!(dir = %output_dir.display(), base, "outputs extracted");
    Ok(())
}

fn copy_output(run_dir: &Path, unit: &str, output_dir: &Path, name: &str) -> Result<()> {
    let source = run_dir.join(unit);
    if !source.is_file() {
        return Err(SynspecError::MissingOutputFile {
            name: unit.to_string(),
            dir: run_dir.to_path_buf(),
        }
        .into());
    }
    let dest = output_dir.join(name);
    // Copying a file onto itself truncates it before reading.
    if dest == source {
        debug!(file = %dest.display(), "output already under its final name");
        return Ok(());
    }
    fs::copy(&source, &dest)
        .with_context(|| format!("copy {} to {}", source.display(), dest.display()))?;
    Ok(())
}
