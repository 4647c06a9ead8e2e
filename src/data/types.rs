//! Data layer errors

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading price and listing files
#[derive(Debug, Error)]
pub enum IngestError {
    /// A price line could not be parsed; the line is skipped
    #[error("Malformed record at line {line}: {content}")]
    MalformedRecord { line: u64, content: String },
    /// The source could not be read at all
    #[error("Could not open {path:?}: {source}")]
    IngestionFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Unknown price column name
    #[error("Unknown price field: {0}")]
    UnknownPriceField(String),
}

/// Errors raised while writing result files
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error on {path:?}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}
