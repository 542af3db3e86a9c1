//! Error types for upscale-batch
//!
//! Errors come in two disjoint tiers:
//! - [`ValidationError`] - detected before any network call; aborts the whole submission
//! - [`ProcessingError`] - detected per item while the batch runs; isolated to that item
//!
//! A batch where every item produced a [`ProcessingError`] escalates to
//! [`Error::AllItemsFailed`]. Every error exposes a stable machine-readable code via
//! `error_code()` for logging and programmatic handling.

use std::time::Duration;
use thiserror::Error;

use crate::types::UpscaleMethod;

/// Result type alias for upscale-batch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for upscale-batch
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "service.base_url")
        key: Option<String>,
    },

    /// Submission rejected before any processing started
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A single-request operation failed at the remote service
    #[error("processing error: {0}")]
    Processing(#[from] ProcessingError),

    /// Every item of the batch failed; no output was produced
    #[error("all items failed to process:\n{}", .failures.join("\n"))]
    AllItemsFailed {
        /// One `"<filename>: <message>"` line per failed item, in input order
        failures: Vec<String>,
    },

    /// Archive could not be written
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP client could not be constructed
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Pre-flight validation failures
///
/// Raised before any network work begins. In the isolate-on-process submission
/// policy the per-item variants are wrapped in [`ProcessingError::InvalidItem`] instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// No items were submitted
    #[error("no images were submitted")]
    NoItems,

    /// Too many items in one batch
    #[error("too many images: {count} submitted, at most {max} allowed")]
    CountExceeded {
        /// Number of items submitted
        count: usize,
        /// Configured maximum
        max: usize,
    },

    /// Item has no content
    #[error("{filename}: file is empty")]
    Empty {
        /// Offending item
        filename: String,
    },

    /// Item is larger than the configured limit
    #[error("{filename}: file is too large ({size} bytes, at most {max} bytes allowed)")]
    SizeExceeded {
        /// Offending item
        filename: String,
        /// Item size in bytes
        size: u64,
        /// Configured maximum in bytes
        max: u64,
    },

    /// Item is not an image
    #[error("{filename}: not an image (content type {mime_type:?})")]
    InvalidType {
        /// Offending item
        filename: String,
        /// The declared MIME type
        mime_type: String,
    },

    /// The requested upscale method is administratively disabled
    #[error("upscale method {method} is disabled")]
    MethodDisabled {
        /// The requested method
        method: UpscaleMethod,
    },

    /// Two items share a filename and the archive collision policy rejects that
    #[error("duplicate filename {filename} in batch")]
    DuplicateFilename {
        /// The repeated filename
        filename: String,
    },
}

/// Per-item failures while talking to the remote transformation service
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessingError {
    /// The remote call exceeded its deadline
    #[error("request timed out after {after:?}")]
    Timeout {
        /// The deadline that was exceeded
        after: Duration,
    },

    /// No response was received
    #[error("could not reach the transformation service: {reason}")]
    Unreachable {
        /// Transport-level reason
        reason: String,
    },

    /// The service answered with a structured error
    #[error("{message}")]
    ServerRejected {
        /// Message extracted from the error body
        message: String,
    },

    /// The service answered with something that could not be interpreted
    #[error("{message}")]
    Unknown {
        /// Raw HTTP status, when a response was received
        status: Option<u16>,
        /// Description of what went wrong
        message: String,
    },

    /// The item violated a submission limit (isolate-on-process policy)
    #[error("{0}")]
    InvalidItem(ValidationError),
}

impl Error {
    /// Machine-readable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Validation(e) => e.error_code(),
            Error::Processing(e) => e.error_code(),
            Error::AllItemsFailed { .. } => "all_items_failed",
            Error::Archive(_) => "archive_error",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::Network(_) => "network_error",
        }
    }

    /// Whether this error was raised before any network call was issued
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_) | Error::Config { .. })
    }
}

impl ValidationError {
    /// Description of the violation without the offending filename
    pub fn reason(&self) -> String {
        match self {
            ValidationError::Empty { .. } => "file is empty".to_string(),
            ValidationError::SizeExceeded { size, max, .. } => format!(
                "file is too large ({} bytes, at most {} bytes allowed)",
                size, max
            ),
            ValidationError::InvalidType { mime_type, .. } => {
                format!("not an image (content type {:?})", mime_type)
            }
            other => other.to_string(),
        }
    }

    /// Machine-readable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            ValidationError::NoItems => "no_items",
            ValidationError::CountExceeded { .. } => "count_exceeded",
            ValidationError::Empty { .. } => "empty",
            ValidationError::SizeExceeded { .. } => "size_exceeded",
            ValidationError::InvalidType { .. } => "invalid_type",
            ValidationError::MethodDisabled { .. } => "method_disabled",
            ValidationError::DuplicateFilename { .. } => "duplicate_filename",
        }
    }
}

impl ProcessingError {
    /// Message for an item's failure line, without the filename
    pub fn item_message(&self) -> String {
        match self {
            ProcessingError::InvalidItem(e) => e.reason(),
            other => other.to_string(),
        }
    }

    /// Machine-readable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            ProcessingError::Timeout { .. } => "timeout",
            ProcessingError::Unreachable { .. } => "unreachable",
            ProcessingError::ServerRejected { .. } => "server_rejected",
            ProcessingError::Unknown { .. } => "unknown",
            ProcessingError::InvalidItem(e) => e.error_code(),
        }
    }

    /// Classify a transport error from the HTTP client.
    ///
    /// `deadline` is reported on timeouts.
    pub(crate) fn from_transport(err: &reqwest::Error, deadline: Duration) -> Self {
        if err.is_timeout() {
            ProcessingError::Timeout { after: deadline }
        } else if err.is_connect() || err.is_request() {
            ProcessingError::Unreachable {
                reason: err.to_string(),
            }
        } else if let Some(status) = err.status() {
            ProcessingError::Unknown {
                status: Some(status.as_u16()),
                message: err.to_string(),
            }
        } else {
            ProcessingError::Unknown {
                status: None,
                message: err.to_string(),
            }
        }
    }
}
