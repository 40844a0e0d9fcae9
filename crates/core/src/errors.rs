use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Storage fault; reported to callers as an opaque internal error.
    #[error("Database error: {0}")]
    Database(#[from] eyre::Report),
}

pub type BookingResult<T> = Result<T, BookingError>;

/// Coarse category of a [`BookingError`], as reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Forbidden,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "VALIDATION"),
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Conflict => write!(f, "CONFLICT"),
            Self::Forbidden => write!(f, "FORBIDDEN"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The `{kind, message}` pair handed to whatever layer sits in front of the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
}

impl BookingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BookingError::Validation(_) => ErrorKind::Validation,
            BookingError::NotFound(_) => ErrorKind::NotFound,
            BookingError::Conflict(_) => ErrorKind::Conflict,
            BookingError::Forbidden(_) => ErrorKind::Forbidden,
            BookingError::Database(_) => ErrorKind::Internal,
        }
    }

    /// Only conflicts may be retried; the caller should re-query availability first.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BookingError::Conflict(_))
    }

    /// Storage and internal faults are reported without their detail.
    pub fn report(&self) -> ErrorReport {
        let message = match self {
            BookingError::Validation(msg)
            | BookingError::NotFound(msg)
            | BookingError::Conflict(msg)
            | BookingError::Forbidden(msg) => msg.clone(),
            BookingError::Database(_) => "An internal error occurred".to_string(),
        };

        ErrorReport {
            kind: self.kind(),
            message,
        }
    }
}
