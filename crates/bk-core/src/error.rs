//! Error types for bumpkit

use std::path::PathBuf;

use thiserror::Error;

/// bumpkit error type
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No chi-square value could be recovered from a statistics file
    #[error("Malformed statistics file: {0}")]
    MalformedStatsFile(String),

    /// A tagged numeric token is not a valid floating point number
    #[error("Invalid number on line {line}: {text:?}")]
    NumericParseError {
        /// 1-based line number in the input.
        line: usize,
        /// Raw text of the offending line.
        text: String,
    },

    /// A scope was constructed with a missing or unusable argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A directory could not be entered
    #[error("Directory unavailable: {}: {source}", path.display())]
    DirectoryUnavailable {
        /// Directory that could not be entered.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// A scope was entered or exited out of sequence
    #[error("Scope misuse: {0}")]
    DoubleExitMisuse(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
