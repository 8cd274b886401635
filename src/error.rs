//! Error types for ggq
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, invalid quest data, bad config)
//! - 4: Operation failed (IO, serialization, lock contention)

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the ggq CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for ggq operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Quest not found: {0}")]
    QuestNotFound(String),

    #[error("Invalid quest kind: expected {expected}, got {actual}")]
    InvalidQuestKind { expected: String, actual: String },

    #[error("Invalid target count: {0} (must be greater than 0)")]
    InvalidTargetCount(i64),

    #[error("Missing count scope for quantitative quest")]
    MissingCountScope,

    #[error("Invalid period: {0} days (must be greater than 0)")]
    InvalidPeriod(i64),

    #[error("Unsupported quest kind: {0}")]
    UnsupportedQuestKind(String),

    // Operation failures (exit code 4)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Lock acquisition failed: {0}")]
    LockFailed(PathBuf),

    #[error("Profile unavailable: {0}")]
    ProfileUnavailable(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidConfig(_)
            | Error::InvalidArgument(_)
            | Error::QuestNotFound(_)
            | Error::InvalidQuestKind { .. }
            | Error::InvalidTargetCount(_)
            | Error::MissingCountScope
            | Error::InvalidPeriod(_)
            | Error::UnsupportedQuestKind(_) => exit_codes::USER_ERROR,

            Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_)
            | Error::LockFailed(_)
            | Error::ProfileUnavailable(_)
            | Error::OperationFailed(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Structured detail payload for JSON error output
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::InvalidQuestKind { expected, actual } => Some(serde_json::json!({
                "expected": expected,
                "actual": actual,
            })),
            Error::InvalidTargetCount(value) | Error::InvalidPeriod(value) => {
                Some(serde_json::json!({ "value": value }))
            }
            Error::UnsupportedQuestKind(kind) => Some(serde_json::json!({ "kind": kind })),
            Error::QuestNotFound(id) => Some(serde_json::json!({ "id": id })),
            Error::InvalidConfig(message) | Error::InvalidArgument(message) => {
                Some(serde_json::json!({ "message": message }))
            }
            Error::LockFailed(path) => Some(serde_json::json!({ "path": path })),
            _ => None,
        }
    }
}

/// Result type alias for ggq operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wrapper for displaying errors in JSON format
#[derive(serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            error: err.to_string(),
            code: err.exit_code(),
            details: err.details(),
        }
    }
}
