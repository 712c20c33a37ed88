use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the ASKUE crates.
///
/// Parsing of 30917 files never returns these: per-file problems become
/// [`IngestIssue`](crate::models::IngestIssue)s and bad lines are dropped.
/// This type covers the I/O and persistence edges around the parser.
#[derive(Error, Debug)]
pub enum AskueError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A CSV document could not be read or written.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A date or timestamp column held a value that does not parse.
    #[error("Invalid timestamp format: {0}")]
    TimestampParse(String),

    /// A channel suffix outside `1..=4` was found in stored data.
    #[error("Unknown channel suffix: {0}")]
    UnknownChannel(u8),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the ASKUE crates.
pub type Result<T> = std::result::Result<T, AskueError>;
