//! Crate-level error type and `Result` alias.
//! Wraps I/O, USFM, USX and rendering-engine errors, plus configuration and
//! argument validation failures.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("USFM error: {0}")]
    Usfm(#[from] crate::io::UsfmError),

    #[error("USX error: {0}")]
    Usx(#[from] crate::io::UsxError),

    #[error("Rendering engine error: {0}")]
    Engine(#[from] crate::io::writers::EngineError),

    #[error("Invalid config file {path}: {message}")]
    Config { path: String, message: String },

    #[error("Invalid argument: {arg}={value}")]
    InvalidArgument { arg: &'static str, value: String },
}
