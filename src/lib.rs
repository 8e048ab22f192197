//! Safe staged execution of the SYNSPEC spectral synthesis program.
//!
//! SYNSPEC reads and writes fixed `fort.NN` unit files in whatever directory
//! it runs in, so two concurrent runs in one directory silently corrupt each
//! other. This crate wraps an installed `synspec` executable behind a
//! pipeline that locks the run directory, symlinks the inputs into place
//! under the names the program expects, invokes it with the right stdio
//! wiring, and copies the outputs back out under the model's name. The
//! architecture keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (link planning, Fortran input
//!   parsing and rendering). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (locking, staging, process
//!   execution, output collection). Isolated to enable scripted stand-ins in
//!   tests.
//!
//! The [`run`] module coordinates core logic with I/O into one call:
//!
//! ```no_run
//! use synspec::{RunRequest, Synspec};
//!
//! # fn main() -> anyhow::Result<()> {
//! let synspec = Synspec::builder().program("synspec").version(51).build()?;
//! synspec.run(&RunRequest::new("hhe35lt"))?;
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod error;
pub mod io;
pub mod logging;
pub mod run;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use error::SynspecError;
pub use io::run_dir::RunDirSpec;
pub use run::{RunRequest, Synspec, SynspecBuilder};
