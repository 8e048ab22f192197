//! Pure, deterministic logic: link planning and fixed-format codecs.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data and return deterministic outputs suitable for tests.

pub mod fortran;
pub mod links;
pub mod model_input;
pub mod unit55;
pub mod unit56;
