//! Error type for the `rplus` CLI.
//!
//! Wraps the library's own [`rplus::Error`] (lex/parse/compile/runtime
//! failures) alongside the I/O errors the CLI itself can produce, via
//! `thiserror`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Language(#[from] rplus::Error),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Usage(String),
}

pub type Result<T> = std::result::Result<T, CliError>;
