use thiserror::Error;

/// Application-specific errors for the CLI. Any of them aborts the run with
/// exit code 1; per-file conversion failures are reported and counted instead.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("No files found matching pattern: {pattern}")]
    NoMatches { pattern: String },

    /// Invalid glob pattern (`Error::InvalidArgument`) or config file (`Error::Config`)
    #[error("{0}")]
    Convert(#[from] usfm2pdf::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
