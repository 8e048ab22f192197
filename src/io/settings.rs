//! Wrapper settings stored as a TOML file.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::error::SynspecError;
use crate::io::lock::LockOptions;
use crate::run::SUPPORTED_VERSION;

/// Wrapper settings (TOML).
///
/// This file is intended to be edited by humans. Missing fields keep their
/// built-in defaults, so a partial file is valid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Program to invoke; a bare name is resolved on `PATH`.
    pub program: String,

    /// SYNSPEC version the inputs are written for.
    pub version: u32,

    pub lock: LockSettings,

    /// Staged-link overrides: destination name -> source path. `{model}`
    /// placeholders are substituted in both.
    pub links: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LockSettings {
    /// Lock file name created inside the run directory.
    pub file_name: String,

    /// Seconds after which an existing lock is presumed abandoned.
    pub stale_secs: u64,

    /// Verify at release that the lock file still holds our token.
    pub verify_on_release: bool,
}

impl Default for LockSettings {
    fn default() -> Self {
        let options = LockOptions::default();
        Self {
            file_name: options.file_name,
            stale_secs: options.stale_after.as_secs(),
            verify_on_release: options.verify_on_release,
        }
    }
}

impl LockSettings {
    /// Convert to runtime lock options.
    pub fn to_options(&self) -> LockOptions {
        LockOptions {
            file_name: self.file_name.clone(),
            stale_after: Duration::from_secs(self.stale_secs),
            verify_on_release: self.verify_on_release,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            program: "synspec".to_string(),
            version: SUPPORTED_VERSION,
            lock: LockSettings::default(),
            links: BTreeMap::new(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.program.trim().is_empty() {
            return Err(anyhow!("program must be non-empty"));
        }
        if self.version != SUPPORTED_VERSION {
            return Err(SynspecError::UnsupportedVersion(self.version).into());
        }
        if self.lock.file_name.trim().is_empty() {
            return Err(anyhow!("lock.file_name must be non-empty"));
        }
        if self.lock.stale_secs == 0 {
            return Err(anyhow!("lock.stale_secs must be > 0"));
        }
        Ok(())
    }
}

/// Load settings from a TOML file.
///
/// If the file is missing, returns `Settings::default()`.
pub fn load_settings(path: &Path) -> Result<Settings> {
    if !path.exists() {
        let settings = Settings::default();
        settings.validate()?;
        return Ok(settings);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let settings: Settings =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    settings.validate()?;
    Ok(settings)
}

/// Atomically write settings to disk (temp file + rename).
pub fn save_settings(path: &Path, settings: &Settings) -> Result<()> {
    settings.validate()?;
    let mut buf = toml::to_string_pretty(settings).context("serialize settings toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("settings path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp settings {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace settings {}", path.display()))?;
    Ok(())
}
