//! Error types for bulk-import
//!
//! Errors fall into three classes with very different handling:
//! - per-item parse/dispatch failures ([`ParseError::Item`], handler errors):
//!   counted against the run and logged, never fatal
//! - fatal run faults ([`ParseError::Fatal`], storage read errors): end the
//!   run early with partial counters
//! - configuration errors: raised at service construction, never mid-run

use thiserror::Error;

/// Result type alias for bulk-import operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for bulk-import
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "notify.jwt_secret")
        key: Option<String>,
    },

    /// Object storage read failed
    #[error("storage error: {0}")]
    Storage(String),

    /// Downstream task enqueue failed
    #[error("task queue error: {0}")]
    TaskQueue(String),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Auth token signing failed
    #[error("token signing error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Parse failures produced by the import parsers
///
/// Parsers yield these inline with discovered items; the orchestrator decides
/// what each variant means for the run.
#[derive(Debug, Error)]
pub enum ParseError {
    /// One item could not be parsed or resolved; the run continues
    #[error("item skipped: {reason}")]
    Item {
        /// Why this item was skipped
        reason: String,
    },

    /// The input stream itself is unreadable; the run ends with partial counters
    #[error("fatal parse failure: {reason}")]
    Fatal {
        /// Why the input could not be read further
        reason: String,
    },
}

/// Content extraction errors
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The document parsed but yielded no readable body text
    #[error("document has no readable content")]
    EmptyContent,

    /// The document could not be processed at all
    #[error("extraction failed: {0}")]
    Failed(String),
}
