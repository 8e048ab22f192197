//! Declarative table of the files staged into a run directory.
//!
//! The program reads its inputs under fixed names in whatever directory it
//! runs in. A [`LinkTable`] maps each of those destination names to a source
//! path; [`LinkTable::plan`] resolves the whole table into a [`StagePlan`]
//! before anything touches the filesystem.

use std::path::{Component, Path, PathBuf};

use anyhow::Result;

use crate::error::SynspecError;

/// Line list read by the program.
pub const LINE_LIST: &str = "fort.19";
/// Synthesis run configuration.
pub const RUN_CONFIG: &str = "fort.55";
/// Primary model input record, fed to the program's stdin.
pub const MODEL_INPUT: &str = "{model}.5";
/// Model atmosphere table.
pub const MODEL_TABLE: &str = "{model}.7";

const MODEL_PLACEHOLDER: &str = "{model}";

/// Substitute the model name into a link template.
pub fn expand(template: &str, model: &str) -> String {
    template.replace(MODEL_PLACEHOLDER, model)
}

/// One staged file: a destination name in the run directory and the source it
/// links to. Both sides may contain the `{model}` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEntry {
    pub dest: String,
    pub source: String,
}

/// Immutable table of staged links, keyed by destination name.
///
/// The default table carries the four inputs every run needs: [`LINE_LIST`],
/// [`RUN_CONFIG`], [`MODEL_INPUT`] and [`MODEL_TABLE`], each sourced from the
/// invoking directory under its own name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkTable {
    entries: Vec<LinkEntry>,
}

impl LinkTable {
    pub fn builder() -> LinkTableBuilder {
        LinkTableBuilder::new()
    }

    /// Entries in staging order. Overriding a default keeps its position.
    pub fn entries(&self) -> &[LinkEntry] {
        &self.entries
    }

    /// Resolve every entry for `model` into concrete staging actions.
    ///
    /// Sources resolve against `invoke_dir` (where the caller's relative paths
    /// are rooted), destinations against `run_dir`; both directories must be
    /// absolute. Resolution is lexical, nothing is touched on disk. An entry
    /// whose source and destination collapse to the same path fails with
    /// [`SynspecError::InvalidLink`], except when the run directory is the
    /// invoking directory, where it means the file is already in place.
    pub fn plan(&self, model: &str, run_dir: &Path, invoke_dir: &Path) -> Result<StagePlan> {
        let mut actions = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let dest_name = expand(&entry.dest, model);
            let source = absolutize(invoke_dir, Path::new(&expand(&entry.source, model)));
            let dest = absolutize(run_dir, Path::new(&dest_name));
            if source == dest {
                if run_dir == invoke_dir {
                    actions.push(StageAction::Keep { dest });
                    continue;
                }
                return Err(SynspecError::InvalidLink {
                    dest: dest_name,
                    path: dest,
                }
                .into());
            }
            actions.push(StageAction::Link { source, dest });
        }
        Ok(StagePlan { actions })
    }
}

impl Default for LinkTable {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Fluent construction of a [`LinkTable`], seeded with the default entries.
#[derive(Debug, Clone)]
pub struct LinkTableBuilder {
    entries: Vec<LinkEntry>,
}

impl LinkTableBuilder {
    fn new() -> Self {
        let entries = [LINE_LIST, RUN_CONFIG, MODEL_INPUT, MODEL_TABLE]
            .into_iter()
            .map(|name| LinkEntry {
                dest: name.to_string(),
                source: name.to_string(),
            })
            .collect();
        Self { entries }
    }

    /// Stage `name` into the run directory under its own name.
    pub fn link(self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.link_as(name.clone(), name)
    }

    /// Stage `source` into the run directory as `dest`, replacing any earlier
    /// entry for the same destination.
    pub fn link_as(mut self, source: impl Into<String>, dest: impl Into<String>) -> Self {
        let entry = LinkEntry {
            dest: dest.into(),
            source: source.into(),
        };
        match self.entries.iter_mut().find(|e| e.dest == entry.dest) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
        self
    }

    pub fn build(self) -> LinkTable {
        LinkTable {
            entries: self.entries,
        }
    }
}

/// Fully resolved staging actions, computed before any filesystem change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagePlan {
    pub actions: Vec<StageAction>,
}

/// One resolved entry of a [`StagePlan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageAction {
    /// Create a symlink at `dest` pointing to `source`.
    Link { source: PathBuf, dest: PathBuf },
    /// The file is already in place under its final name.
    Keep { dest: PathBuf },
}

/// Resolve `path` against `base` without touching the filesystem.
///
/// `.` and `..` components collapse lexically, so the result is stable even
/// when intermediate directories do not exist yet.
fn absolutize(base: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };
    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
