//! Capforge Error Definitions
//!
//! Defines error types used throughout the project.

use thiserror::Error;

/// User-input validation failures.
///
/// None of these are fatal: `EmptyName` blocks a commit until the user fixes
/// the name, and `InvalidNumeric` is normally absorbed by falling back to the
/// field default.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Template name cannot be empty")]
    EmptyName,

    #[error("Invalid numeric value for {field}: {input:?}")]
    InvalidNumeric { field: &'static str, input: String },
}

/// Core engine error types
#[derive(Error, Debug)]
pub enum CoreError {
    // =========================================================================
    // Editing Errors
    // =========================================================================
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Missing reference: {0}")]
    MissingReference(String),

    #[error("Invalid aspect ratio: {0} (expected 9:16, 16:9 or 1:1)")]
    InvalidAspectRatio(String),

    // =========================================================================
    // General Errors
    // =========================================================================
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Core engine result type
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Convert to a user-friendly message for a front end notice
    pub fn to_user_message(&self) -> String {
        match self {
            CoreError::Validation(ValidationError::EmptyName) => {
                "Please enter a template name".to_string()
            }
            other => other.to_string(),
        }
    }
}
