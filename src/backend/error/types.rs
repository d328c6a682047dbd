/**
 * Backend Error Types
 *
 * This module defines the single error type returned by stores, services
 * and HTTP handlers. Every variant maps to one fixed HTTP status.
 *
 * # Status Mapping
 *
 * | Variant            | Status |
 * |--------------------|--------|
 * | `InvalidArgument`  | 400    |
 * | `SharedError`      | 400    |
 * | `Unauthenticated`  | 401    |
 * | `Forbidden`        | 403    |
 * | `NotFound`         | 404    |
 * | `Conflict`         | 409    |
 * | `Unavailable`      | 503    |
 * | `Internal`         | 500    |
 * | `Database`         | 500    |
 * | `SerializationError` | 500  |
 *
 * Messages of 500-class errors are never sent to clients; see
 * [`BackendError::public_message`].
 */

use thiserror::Error;
use axum::http::StatusCode;
use crate::shared::SharedError;

/// Result alias used across the backend
pub type BackendResult<T> = Result<T, BackendError>;

/// Backend-specific error types
///
/// # Usage
///
/// ```rust
/// use chatline::backend::error::BackendError;
///
/// let err = BackendError::not_found("Chat not found");
/// assert_eq!(err.status_code().as_u16(), 404);
/// ```
#[derive(Debug, Error)]
pub enum BackendError {
    /// Malformed or semantically invalid input
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Missing, expired or invalid credential
    #[error("Unauthenticated: {message}")]
    Unauthenticated { message: String },

    /// Authenticated but not allowed to touch the resource
    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Uniqueness violation, e.g. a duplicate email
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// The server is shutting down or otherwise refusing new work
    #[error("Unavailable: {message}")]
    Unavailable { message: String },

    /// Store, provider or other server-side failure
    #[error("Internal error: {message}")]
    Internal { message: String },

    /// Validation error from the shared module
    #[error(transparent)]
    SharedError(#[from] SharedError),

    /// Database failure not covered by a more specific variant
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// JSON serialization error on the server side
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl BackendError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::Unauthenticated {
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidArgument { .. } => StatusCode::BAD_REQUEST,
            Self::SharedError(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal { .. } | Self::Database(_) | Self::SerializationError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get the error message, including internal details
    pub fn message(&self) -> String {
        match self {
            Self::InvalidArgument { message }
            | Self::Unauthenticated { message }
            | Self::Forbidden { message }
            | Self::NotFound { message }
            | Self::Conflict { message }
            | Self::Unavailable { message }
            | Self::Internal { message } => message.clone(),
            Self::SharedError(err) => match err {
                SharedError::ValidationError { message, .. } => message.clone(),
                SharedError::SerializationError { message } => message.clone(),
            },
            Self::Database(err) => err.to_string(),
            Self::SerializationError(err) => err.to_string(),
        }
    }

    /// Whether this is a server-side failure whose detail must stay private
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Internal { .. } | Self::Database(_) | Self::SerializationError(_)
        )
    }

    /// The message safe to show a client
    pub fn public_message(&self) -> String {
        if self.is_internal() {
            "Internal server error".to_string()
        } else {
            self.message()
        }
    }
}
