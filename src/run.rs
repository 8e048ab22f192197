//! End-to-end orchestration of one synthesis run.
//!
//! [`Synspec`] holds the immutable run configuration: which program to
//! invoke, the link table and the lock policy. A [`RunRequest`] names the
//! model and where the run should happen. One call to [`Synspec::run`] locks
//! the run directory, stages the inputs, invokes the program and collects the
//! outputs.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::{info, instrument};

use crate::core::links::{LinkTable, LinkTableBuilder};
use crate::error::SynspecError;
use crate::io::extract::extract_outputs;
use crate::io::lock::LockOptions;
use crate::io::preflight::check_inputs;
use crate::io::program::{SynspecProgram, Synthesizer};
use crate::io::run_dir::{RunDir, RunDirSpec};
use crate::io::settings::Settings;
use crate::io::stage;

/// The only SYNSPEC version this wrapper knows the unit layout of.
pub const SUPPORTED_VERSION: u32 = 51;

/// Configured synthesis pipeline. Build one with [`Synspec::builder`] and
/// reuse it across runs.
#[derive(Debug, Clone)]
pub struct Synspec {
    program: SynspecProgram,
    links: LinkTable,
    lock_options: LockOptions,
}

/// One synthesis to perform: the model name plus run placement and output
/// overrides.
#[derive(Debug, Clone)]
pub struct RunRequest {
    model: String,
    run_dir: RunDirSpec,
    output_dir: Option<PathBuf>,
    output_name: Option<String>,
}

impl RunRequest {
    /// Request a run for `model` in the current directory.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            run_dir: RunDirSpec::default(),
            output_dir: None,
            output_name: None,
        }
    }

    /// Where the run executes.
    pub fn run_dir(mut self, spec: RunDirSpec) -> Self {
        self.run_dir = spec;
        self
    }

    /// Directory the outputs are copied to. Defaults to the run directory,
    /// or to the invoking directory for temporary runs. Relative paths
    /// resolve against the invoking directory.
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Base name of the copied outputs. Defaults to the model name.
    pub fn output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = Some(name.into());
        self
    }
}

impl Synspec {
    pub fn builder() -> SynspecBuilder {
        SynspecBuilder::new()
    }

    /// Build a pipeline from loaded [`Settings`].
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        settings.validate()?;
        let mut builder = Self::builder()
            .program(&settings.program)
            .version(settings.version)
            .lock_options(settings.lock.to_options());
        for (dest, source) in &settings.links {
            builder = builder.link_as(source, dest);
        }
        builder.build()
    }

    /// The staged links this pipeline will plan for each run.
    pub fn links(&self) -> &LinkTable {
        &self.links
    }

    /// Execute one synthesis run end to end.
    ///
    /// Locks the run directory, stages the link table, checks inputs, invokes
    /// the program and copies the outputs out. On failure the lock is still
    /// released (or the temporary directory removed) before the error is
    /// returned.
    pub fn run(&self, request: &RunRequest) -> Result<()> {
        self.run_with(&self.program, request)
    }

    /// [`Synspec::run`] with a caller-supplied [`Synthesizer`] in place of
    /// the configured program.
    #[instrument(skip_all, fields(model = %request.model))]
    pub fn run_with<S: Synthesizer>(&self, synthesizer: &S, request: &RunRequest) -> Result<()> {
        if request.model.trim().is_empty() {
            return Err(anyhow!("model name must be non-empty"));
        }
        let invoke_dir = env::current_dir().context("resolve invoking directory")?;
        let run_dir = RunDir::resolve(&request.run_dir, &self.lock_options)?;

        let attempt = (|| -> Result<()> {
            let plan = self
                .links
                .plan(&request.model, run_dir.path(), &invoke_dir)?;
            stage::apply(&plan)?;
            check_inputs(&request.model, run_dir.path())?;
            synthesizer.synthesize(&request.model, run_dir.path())?;

            let output_dir = resolve_output_dir(request, run_dir.path(), &invoke_dir);
            let base = request.output_name.as_deref().unwrap_or(&request.model);
            extract_outputs(run_dir.path(), &output_dir, base)?;
            info!(model = %request.model, outputs = %output_dir.display(), "synthesis complete");
            Ok(())
        })();

        match attempt {
            Ok(()) => run_dir.finish(),
            Err(err) => {
                // Cleanup must not mask the failure; drop releases best-effort.
                drop(run_dir);
                Err(err)
            }
        }
    }
}

fn resolve_output_dir(request: &RunRequest, run_dir: &Path, invoke_dir: &Path) -> PathBuf {
    match &request.output_dir {
        Some(dir) if dir.is_absolute() => dir.clone(),
        Some(dir) => invoke_dir.join(dir),
        None => match request.run_dir {
            RunDirSpec::Temporary => invoke_dir.to_path_buf(),
            _ => run_dir.to_path_buf(),
        },
    }
}

/// Fluent construction of a [`Synspec`] pipeline.
#[derive(Debug, Clone)]
pub struct SynspecBuilder {
    program: PathBuf,
    version: u32,
    links: LinkTableBuilder,
    lock_options: LockOptions,
}

impl SynspecBuilder {
    fn new() -> Self {
        Self {
            program: PathBuf::from("synspec"),
            version: SUPPORTED_VERSION,
            links: LinkTable::builder(),
            lock_options: LockOptions::default(),
        }
    }

    /// Program to invoke; a bare name is resolved on `PATH`.
    pub fn program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// SYNSPEC version the inputs are written for. [`build`](Self::build)
    /// rejects anything but [`SUPPORTED_VERSION`].
    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Stage `name` into the run directory under its own name.
    pub fn link(mut self, name: impl Into<String>) -> Self {
        self.links = self.links.link(name);
        self
    }

    /// Stage `source` into the run directory as `dest`. Both sides may use
    /// the `{model}` placeholder.
    pub fn link_as(mut self, source: impl Into<String>, dest: impl Into<String>) -> Self {
        self.links = self.links.link_as(source, dest);
        self
    }

    pub fn lock_options(mut self, options: LockOptions) -> Self {
        self.lock_options = options;
        self
    }

    pub fn build(self) -> Result<Synspec> {
        if self.version != SUPPORTED_VERSION {
            return Err(SynspecError::UnsupportedVersion(self.version).into());
        }
        Ok(Synspec {
            program: SynspecProgram::new(self.program),
            links: self.links.build(),
            lock_options: self.lock_options,
        })
    }
}
