//! Side-effecting operations: locking, staging, execution, extraction.

pub mod extract;
pub mod lock;
pub mod preflight;
pub mod program;
pub mod run_dir;
pub mod settings;
pub mod stage;
