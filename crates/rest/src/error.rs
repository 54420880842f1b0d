//! Error types for the REST API.
//!
//! Every error renders as a FHIR `OperationOutcome` with the matching HTTP
//! status.
//!
//! # Error Mapping
//!
//! | Store Error | HTTP Status | Issue Code |
//! |-------------|-------------|------------|
//! | NotFound | 404 | not-found |
//! | VersionNotFound | 404 | not-found |
//! | Gone | 410 | deleted |
//! | VersionConflict | 409 | conflict |
//! | AlreadyExists | 409 | duplicate |
//! | InvalidIfMatch | 400 | invalid |
//! | Non-JSON body | 415 | not-supported |
//! | BackendError | 500 | exception |

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use helios_vstore::error::{BackendError, ConcurrencyError, ResourceError, StorageError};
use helios_vstore::precondition::InvalidIfMatch;
use std::fmt;
use tracing::error;

use crate::responses::operation_outcome::create_operation_outcome;

/// The primary error type for REST API operations.
#[derive(Debug)]
pub enum RestError {
    /// Resource not found (HTTP 404).
    NotFound {
        /// The resource type (e.g., "Patient").
        resource_type: String,
        /// The resource ID.
        id: String,
    },

    /// Resource was deleted (HTTP 410 Gone).
    Gone {
        /// The resource type.
        resource_type: String,
        /// The resource ID.
        id: String,
    },

    /// Version not found for vread (HTTP 404).
    VersionNotFound {
        /// The resource type.
        resource_type: String,
        /// The resource ID.
        id: String,
        /// The version ID as requested.
        version_id: String,
    },

    /// The head moved past the expected version (HTTP 409).
    VersionConflict {
        /// The resource type.
        resource_type: String,
        /// The resource ID.
        id: String,
        /// Message describing the conflict.
        message: String,
    },

    /// A client-supplied id is already taken by an active resource (HTTP 409).
    AlreadyExists {
        /// The resource type.
        resource_type: String,
        /// The resource ID.
        id: String,
    },

    /// Bad request (HTTP 400).
    BadRequest {
        /// Error message.
        message: String,
    },

    /// Unsupported media type (HTTP 415).
    UnsupportedMediaType {
        /// The unsupported content type.
        content_type: String,
    },

    /// Method not allowed (HTTP 405).
    MethodNotAllowed {
        /// The method that was attempted.
        method: String,
        /// The resource type.
        resource_type: String,
    },

    /// Internal server error (HTTP 500).
    InternalError {
        /// Error message.
        message: String,
    },
}

impl fmt::Display for RestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestError::NotFound { resource_type, id } => {
                write!(f, "Resource not found: {}/{}", resource_type, id)
            }
            RestError::Gone { resource_type, id } => {
                write!(f, "Resource deleted: {}/{}", resource_type, id)
            }
            RestError::VersionNotFound {
                resource_type,
                id,
                version_id,
            } => {
                write!(
                    f,
                    "Version not found: {}/{}/_history/{}",
                    resource_type, id, version_id
                )
            }
            RestError::VersionConflict { message, .. } => {
                write!(f, "Version conflict: {}", message)
            }
            RestError::AlreadyExists { resource_type, id } => {
                write!(f, "Resource already exists: {}/{}", resource_type, id)
            }
            RestError::BadRequest { message } => {
                write!(f, "Bad request: {}", message)
            }
            RestError::UnsupportedMediaType { content_type } => {
                write!(f, "Unsupported media type: {}", content_type)
            }
            RestError::MethodNotAllowed {
                method,
                resource_type,
            } => {
                write!(f, "Method {} not allowed on {}", method, resource_type)
            }
            RestError::InternalError { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for RestError {}

impl RestError {
    /// Returns the HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            RestError::NotFound { .. } | RestError::VersionNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            RestError::Gone { .. } => StatusCode::GONE,
            RestError::VersionConflict { .. } | RestError::AlreadyExists { .. } => {
                StatusCode::CONFLICT
            }
            RestError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            RestError::UnsupportedMediaType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            RestError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            RestError::InternalError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, details) = match &self {
            RestError::NotFound { resource_type, id } => (
                "not-found",
                format!("Resource {}/{} not found", resource_type, id),
            ),
            RestError::Gone { resource_type, id } => (
                "deleted",
                format!("Resource {}/{} has been deleted", resource_type, id),
            ),
            RestError::VersionNotFound {
                resource_type,
                id,
                version_id,
            } => (
                "not-found",
                format!(
                    "Version {} of {}/{} not found",
                    version_id, resource_type, id
                ),
            ),
            RestError::VersionConflict { message, .. } => ("conflict", message.clone()),
            RestError::AlreadyExists { resource_type, id } => (
                "duplicate",
                format!("Resource {}/{} already exists", resource_type, id),
            ),
            RestError::BadRequest { message } => ("invalid", message.clone()),
            RestError::UnsupportedMediaType { content_type } => (
                "not-supported",
                format!("Content type '{}' is not supported", content_type),
            ),
            RestError::MethodNotAllowed {
                method,
                resource_type,
            } => (
                "not-supported",
                format!("Method {} not allowed on {}", method, resource_type),
            ),
            RestError::InternalError { message } => {
                error!(error = %message, "Internal error");
                ("exception", message.clone())
            }
        };

        let operation_outcome = create_operation_outcome("error", code, &details);
        (status, Json(operation_outcome)).into_response()
    }
}

// Implement conversions from store errors

impl From<StorageError> for RestError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Resource(e) => e.into(),
            StorageError::Concurrency(e) => e.into(),
            StorageError::Backend(e) => e.into(),
        }
    }
}

impl From<ResourceError> for RestError {
    fn from(err: ResourceError) -> Self {
        match err {
            ResourceError::NotFound { resource_type, id } => {
                RestError::NotFound { resource_type, id }
            }
            ResourceError::AlreadyExists { resource_type, id } => {
                RestError::AlreadyExists { resource_type, id }
            }
            ResourceError::Gone {
                resource_type, id, ..
            } => RestError::Gone { resource_type, id },
            ResourceError::VersionNotFound {
                resource_type,
                id,
                version_id,
            } => RestError::VersionNotFound {
                resource_type,
                id,
                version_id,
            },
        }
    }
}

impl From<ConcurrencyError> for RestError {
    fn from(err: ConcurrencyError) -> Self {
        match err {
            ConcurrencyError::VersionConflict {
                resource_type,
                id,
                expected_version,
                actual_version,
            } => RestError::VersionConflict {
                resource_type,
                id,
                message: format!(
                    "Expected version {}, but found {}",
                    expected_version, actual_version
                ),
            },
        }
    }
}

impl From<BackendError> for RestError {
    fn from(err: BackendError) -> Self {
        RestError::InternalError {
            message: err.to_string(),
        }
    }
}

impl From<InvalidIfMatch> for RestError {
    fn from(err: InvalidIfMatch) -> Self {
        RestError::BadRequest {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for RestError {
    fn from(err: serde_json::Error) -> Self {
        RestError::BadRequest {
            message: format!("Invalid JSON: {}", err),
        }
    }
}

/// Result type alias for REST operations.
pub type RestResult<T> = Result<T, RestError>;
