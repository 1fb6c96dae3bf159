//! Error Handling
//!
//! Two error families:
//! - `AppError` is fatal. It propagates with `?` to the binary entry point
//!   and turns into exit code 1.
//! - `AnalysisError` is recoverable. Phase and model helpers return it as a
//!   value; callers log it and degrade (confidence 0, no results).

use thiserror::Error;
use todo_tracker_core::CoreError;
use todo_tracker_llm::LlmError;

/// Application-wide fatal error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Document store errors
    #[error("Database error: {0}")]
    Database(String),

    /// SQLite errors (auto-converted from rusqlite::Error)
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Command execution errors (git)
    #[error("Command error: {0}")]
    Command(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Domain errors from the core crate
    #[error(transparent)]
    Core(#[from] CoreError),

    /// An analysis step whose failure ends the run (minutes extraction)
    #[error("Analysis failed: {0}")]
    Analysis(#[from] AnalysisError),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Create a database error
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a command error
    pub fn command(msg: impl Into<String>) -> Self {
        Self::Command(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

/// Recoverable failure of one analysis step.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// The model call failed (network, auth, HTTP status, schema)
    #[error("model call failed: {0}")]
    Llm(#[from] LlmError),

    /// A secret-shaped string was found in text bound for the model
    #[error("secret pattern '{pattern}' detected; analysis aborted")]
    SecretDetected { pattern: String },

    /// The model answered, but not with anything usable
    #[error("invalid model response: {0}")]
    InvalidResponse(String),
}

/// Result type alias for recoverable analysis steps
pub type AnalysisResult<T> = Result<T, AnalysisError>;

impl AnalysisError {
    /// Create an invalid-response error
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Whether this is a fail-closed security abort
    pub fn is_security_abort(&self) -> bool {
        matches!(self, Self::SecretDetected { .. })
    }
}
