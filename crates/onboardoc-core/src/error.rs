//! Error types for onboarding requests

use thiserror::Error;

use onboardoc_convert::{ConvertError, FailureCause};
use onboardoc_ooxml::OoxmlError;

use crate::role::Role;

/// Errors that can occur while producing an onboarding document
#[derive(Error, Debug)]
pub enum OnboardError {
    /// A name is blank or has no usable characters
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// Role text matches no known role
    #[error("Invalid role '{0}' (expected designer or installer)")]
    InvalidRole(String),

    /// The conversion never produced a PDF
    #[error("Conversion failed ({cause}): {detail}")]
    ConversionFailed {
        cause: FailureCause,
        detail: String,
    },

    /// The template store has nothing for this role
    #[error("No template configured for role {0}")]
    TemplateMissing(Role),

    /// Template could not be read or written
    #[error("Template error: {0}")]
    Template(#[from] OoxmlError),

    /// Conversion transport or protocol error
    #[error("Conversion error: {0}")]
    Conversion(ConvertError),

    /// Invalid or incomplete configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ConvertError> for OnboardError {
    fn from(err: ConvertError) -> Self {
        match err {
            ConvertError::ConversionFailed { cause, detail } => {
                OnboardError::ConversionFailed { cause, detail }
            }
            other => OnboardError::Conversion(other),
        }
    }
}

/// Result type for onboarding operations
pub type Result<T> = std::result::Result<T, OnboardError>;
