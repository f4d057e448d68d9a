//! Error types for enrollment
//!
//! Provides error handling for:
//! - Persistence failures and constraint violations
//! - Enrollment preconditions and catalog misconfiguration
//! - Configuration loading
//! - Mapping failures onto caller-visible responses

use crate::types::ActorId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Uniqueness constraints enforced by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Constraint {
    /// Usernames are unique across all accounts
    AccountUsername,
    /// A student owns at most one account
    AccountStudent,
}

impl std::fmt::Display for Constraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AccountUsername => f.write_str("account_username"),
            Self::AccountStudent => f.write_str("account_student"),
        }
    }
}

/// Persistence errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Insert would duplicate a unique value
    #[error("unique constraint {constraint} violated by '{value}'")]
    UniqueViolation { constraint: Constraint, value: String },

    /// Insert references a missing row
    #[error("foreign key violation: {relation} {key} not found")]
    ForeignKeyViolation { relation: &'static str, key: String },

    /// Backend unreachable or refused the operation
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Check if this is a username collision
    #[inline]
    #[must_use]
    pub fn is_username_conflict(&self) -> bool {
        matches!(
            self,
            Self::UniqueViolation {
                constraint: Constraint::AccountUsername,
                ..
            }
        )
    }

    /// Check if error is retryable
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::UniqueViolation { .. } | Self::Unavailable(_))
    }
}

/// Main enrollment error type
#[derive(Debug, thiserror::Error)]
pub enum EnrollmentError {
    /// Acting identity does not exist
    #[error("actor not found: {0}")]
    ActorNotFound(ActorId),

    /// Payload cannot be enrolled
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Required account type is missing from the catalog
    #[error("account type '{designation}' is not configured")]
    AccountTypeMissing { designation: String },

    /// No free username within the configured bound
    #[error("no free username for base '{base}' after {attempts} attempts")]
    UsernameExhausted { base: String, attempts: u32 },

    /// Persistence failure
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl EnrollmentError {
    /// Classification used at the caller boundary
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ActorNotFound(_) => ErrorKind::NotFound,
            Self::InvalidRequest(_) => ErrorKind::InvalidRequest,
            Self::AccountTypeMissing { .. } => ErrorKind::Configuration,
            Self::UsernameExhausted { .. } | Self::Store(_) => ErrorKind::OperationFailed,
        }
    }

    /// HTTP-equivalent status
    #[inline]
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    /// Check if error is retryable
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_retryable())
    }
}

/// Caller-visible error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Unknown actor
    NotFound,
    /// Payload rejected before any write
    InvalidRequest,
    /// Operator must fix reference data
    Configuration,
    /// Anything else
    OperationFailed,
}

impl ErrorKind {
    /// HTTP-equivalent status
    #[must_use]
    pub fn status_code(self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::InvalidRequest => 422,
            Self::Configuration | Self::OperationFailed => 500,
        }
    }

    /// Fixed message shown to callers; never includes the root cause
    #[must_use]
    pub fn public_message(self) -> &'static str {
        match self {
            Self::NotFound => "Actor not found",
            Self::InvalidRequest => "Enrollment request is invalid",
            Self::Configuration | Self::OperationFailed => {
                "Failed to create student with guardian"
            }
        }
    }
}

/// Error payload handed to the request layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorResponse {
    /// Build the caller-facing response for `error`
    #[must_use]
    pub fn from_error(error: &EnrollmentError) -> Self {
        let kind = error.kind();
        let message = match error {
            EnrollmentError::InvalidRequest(reason) => {
                format!("{}: {reason}", kind.public_message())
            }
            _ => kind.public_message().to_string(),
        };
        Self {
            status: kind.status_code(),
            kind,
            message,
        }
    }
}

impl From<&EnrollmentError> for ErrorResponse {
    fn from(error: &EnrollmentError) -> Self {
        Self::from_error(error)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error during file read
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed TOML
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Value out of range
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    /// Create invalid-value error
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
