//! Test-only helpers for run directory fixtures and scripted programs.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::core::links::expand;
use crate::io::preflight::REQUIRED_INPUTS;

/// Write every required input for `model` into `dir` with deterministic
/// contents (`"<name> contents for <model>\n"`).
pub fn write_model_inputs(dir: &Path, model: &str) -> Result<()> {
    for template in REQUIRED_INPUTS {
        let name = expand(template, model);
        let path = dir.join(&name);
        fs::write(&path, format!("{name} contents for {model}\n"))
            .with_context(|| format!("write fixture {}", path.display()))?;
    }
    Ok(())
}

/// Write a shell script at `path` that mimics a successful synthesis.
///
/// The script captures stdin to `stdin.capture`, prints one line to each of
/// stdout and stderr, and writes every output unit except those in `skip`
/// into its working directory.
#[cfg(unix)]
pub fn write_fake_program(path: &Path, skip: &[&str]) -> Result<()> {
    use crate::io::extract::OUTPUT_UNITS;

    let mut script = String::from(
        "#!/bin/sh\n\
         cat > stdin.capture\n\
         echo \"synthesis log\"\n\
         echo \"diagnostics\" >&2\n",
    );
    for (unit, _) in OUTPUT_UNITS {
        if skip.contains(&unit) {
            continue;
        }
        script.push_str(&format!("printf 'data for {unit}\\n' > {unit}\n"));
    }
    write_script(path, &script)
}

/// Write a shell script at `path` that drains stdin, logs one line and exits
/// with `code`.
#[cfg(unix)]
pub fn write_failing_program(path: &Path, code: i32) -> Result<()> {
    let script = format!(
        "#!/bin/sh\n\
         cat > /dev/null\n\
         echo \"about to fail\"\n\
         exit {code}\n"
    );
    write_script(path, &script)
}

#[cfg(unix)]
fn write_script(path: &Path, script: &str) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::write(path, script).with_context(|| format!("write script {}", path.display()))?;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
        .with_context(|| format!("mark executable {}", path.display()))?;
    Ok(())
}
