//! Command Line Interface (CLI) layer for usfm2pdf.
//!
//! This module defines argument parsing (`args`), error types (`errors`),
//! and the orchestration logic (`runner`): glob expansion, output naming,
//! overwrite confirmation and per-file error reporting. The conversion itself
//! is delegated to `usfm2pdf::api`.
pub mod args;
pub mod errors;
pub mod runner;

pub use args::CliArgs;
pub use errors::AppError;
pub use runner::run;
