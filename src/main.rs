//! usfm2pdf CLI entrypoint.
//!
//! Provides a thin wrapper over the `cli` module: parse args, convert every
//! matched file, and exit with status 1 when the run cannot start (for
//! example when the input pattern matches nothing).
//! For programmatic use, prefer the library API (`usfm2pdf::api`).

use std::process::ExitCode;

use clap::Parser;

mod cli;

fn main() -> ExitCode {
    let args = cli::CliArgs::parse();
    match cli::run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
