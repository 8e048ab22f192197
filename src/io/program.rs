//! Invocation of the external synthesis executable.
//!
//! The [`Synthesizer`] trait decouples the pipeline from the real program so
//! tests can substitute scripted stand-ins. [`SynspecProgram`] spawns the
//! configured executable with the stdio contract SYNSPEC expects.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, Result};
use tracing::{debug, info, instrument};

use crate::core::links::{MODEL_INPUT, MODEL_TABLE, expand};
use crate::error::SynspecError;
use crate::io::stage::replace_symlink;

/// Fixed unit name the program reads its model table from.
pub const INPUT_TABLE: &str = "fort.8";
/// Captured stdout and stderr of the program.
pub const LOG_FILE: &str = "fort.log";

/// Runs one synthesis in a prepared run directory.
pub trait Synthesizer {
    /// Run the program for `model` inside `run_dir`.
    fn synthesize(&self, model: &str, run_dir: &Path) -> Result<()>;
}

/// The real SYNSPEC executable.
#[derive(Debug, Clone)]
pub struct SynspecProgram {
    program: PathBuf,
}

impl SynspecProgram {
    /// Wrap the executable at `program`; a bare name is resolved on `PATH`.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Synthesizer for SynspecProgram {
    #[instrument(skip_all, fields(model = %model, dir = %run_dir.display()))]
    fn synthesize(&self, model: &str, run_dir: &Path) -> Result<()> {
        // The program always reads its table from fort.8, whatever the
        // user-facing name; link it right before the run so the freshest
        // staging wins.
        let table = expand(MODEL_TABLE, model);
        replace_symlink(Path::new(&table), &run_dir.join(INPUT_TABLE))?;

        let input_name = expand(MODEL_INPUT, model);
        let input = File::open(run_dir.join(&input_name))
            .with_context(|| format!("open model input {input_name}"))?;
        let log_path = run_dir.join(LOG_FILE);
        let log = File::create(&log_path)
            .with_context(|| format!("create log file {}", log_path.display()))?;
        let log_err = log
            .try_clone()
            .context("clone log handle for stderr")?;

        info!(program = %self.program.display(), "starting synspec");
        let status = Command::new(&self.program)
            .current_dir(run_dir)
            .stdin(Stdio::from(input))
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(log_err))
            .status()
            .with_context(|| format!("spawn {}", self.program.display()))?;

        if !status.success() {
            return Err(SynspecError::ExternalProcessFailed {
                code: status.code(),
                log: log_path,
            }
            .into());
        }
        debug!("synspec completed");
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::fs;

    use super::*;
    use crate::test_support::{write_failing_program, write_fake_program, write_model_inputs};

    #[test]
    fn synthesize_links_table_and_captures_both_streams() {
        let temp = tempfile::tempdir().expect("tempdir");
        write_model_inputs(temp.path(), "hhe35lt").expect("fixtures");
        let program = temp.path().join("fake-synspec");
        write_fake_program(&program, &[]).expect("program");

        SynspecProgram::new(&program)
            .synthesize("hhe35lt", temp.path())
            .expect("synthesize");

        let table = fs::read_link(temp.path().join(INPUT_TABLE)).expect("fort.8");
        assert_eq!(table, Path::new("hhe35lt.7"));

        let log = fs::read_to_string(temp.path().join(LOG_FILE)).expect("log");
        assert!(log.contains("synthesis log"));
        assert!(log.contains("diagnostics"));

        // The model input was bound to stdin.
        let captured = fs::read_to_string(temp.path().join("stdin.capture")).expect("capture");
        assert_eq!(captured, "hhe35lt.5 contents for hhe35lt\n");
    }

    #[test]
    fn nonzero_exit_carries_the_code() {
        let temp = tempfile::tempdir().expect("tempdir");
        write_model_inputs(temp.path(), "hhe35lt").expect("fixtures");
        let program = temp.path().join("fake-synspec");
        write_failing_program(&program, 3).expect("program");

        let err = SynspecProgram::new(&program)
            .synthesize("hhe35lt", temp.path())
            .expect_err("failing program");
        match err.downcast_ref::<SynspecError>() {
            Some(SynspecError::ExternalProcessFailed { code, .. }) => {
                assert_eq!(*code, Some(3));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // The log survives for post-mortem.
        let log = fs::read_to_string(temp.path().join(LOG_FILE)).expect("log");
        assert!(log.contains("about to fail"));
    }

    #[test]
    fn rerun_replaces_previous_table_link() {
        let temp = tempfile::tempdir().expect("tempdir");
        write_model_inputs(temp.path(), "first").expect("fixtures");
        write_model_inputs(temp.path(), "second").expect("fixtures");
        let program = temp.path().join("fake-synspec");
        write_fake_program(&program, &[]).expect("program");
        let runner = SynspecProgram::new(&program);

        runner.synthesize("first", temp.path()).expect("first run");
        runner.synthesize("second", temp.path()).expect("second run");

        let table = fs::read_link(temp.path().join(INPUT_TABLE)).expect("fort.8");
        assert_eq!(table, Path::new("second.7"));
    }
}
