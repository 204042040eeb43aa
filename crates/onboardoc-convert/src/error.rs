//! Error types for conversion operations

use std::fmt;

use thiserror::Error;

/// Why a conversion produced no document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCause {
    /// The job did not reach a terminal state in time
    Timeout,
    /// A task of the job ended in error
    TaskFailed,
    /// The provider rejected the request for quota or rate reasons
    QuotaExceeded,
    /// The provider rejected the request for any other reason
    Provider,
    /// The job finished without a downloadable export
    MissingExport,
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            FailureCause::Timeout => "timed out",
            FailureCause::TaskFailed => "task failed",
            FailureCause::QuotaExceeded => "quota exceeded",
            FailureCause::Provider => "rejected by provider",
            FailureCause::MissingExport => "no export result",
        };
        f.write_str(text)
    }
}

/// Errors that can occur during conversion
#[derive(Error, Debug)]
pub enum ConvertError {
    /// The job never produced an exported file
    #[error("Conversion failed ({cause}): {detail}")]
    ConversionFailed {
        cause: FailureCause,
        detail: String,
    },

    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server returned an error status
    #[error("Server error ({status}): {message}")]
    ServerError {
        status: u16,
        message: String,
    },

    /// Response did not have the expected shape
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConvertError {
    /// Shorthand for [`ConvertError::ConversionFailed`]
    pub fn failed(cause: FailureCause, detail: impl Into<String>) -> Self {
        ConvertError::ConversionFailed {
            cause,
            detail: detail.into(),
        }
    }

    /// Failure cause, if this is a failed conversion
    pub fn cause(&self) -> Option<FailureCause> {
        match self {
            ConvertError::ConversionFailed { cause, .. } => Some(*cause),
            _ => None,
        }
    }
}

/// Result type for conversion operations
pub type Result<T> = std::result::Result<T, ConvertError>;
