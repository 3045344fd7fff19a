//! Error types for the marketplace hub.

use crate::types::ReportFormat;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the marketplace hub.
#[derive(Error, Debug)]
pub enum Error {
    /// The uploaded text was empty or whitespace only.
    #[error("Empty input: nothing to import")]
    EmptyInput,

    /// No supported report signature was found.
    #[error(
        "Unrecognized format (detected: {detected}). \
         Supported: Amazon custom transaction report, eBay order report"
    )]
    FormatUnrecognized { detected: ReportFormat },

    /// The header line was not found within the extractor's lookahead window.
    #[error("{} header not found in the first {lookahead} lines", .format.display_name())]
    HeaderNotFound { format: ReportFormat, lookahead: usize },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Persistence backend error.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Export error (table or document serialization).
    #[error("Export error: {0}")]
    Export(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a header-not-found error for the given format.
    pub fn header_not_found(format: ReportFormat, lookahead: usize) -> Self {
        Error::HeaderNotFound { format, lookahead }
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a storage error.
    pub fn storage(msg: impl Into<String>) -> Self {
        Error::Storage(msg.into())
    }

    /// Create an export error.
    pub fn export(msg: impl Into<String>) -> Self {
        Error::Export(msg.into())
    }
}
