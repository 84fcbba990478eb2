//! Error types for the cache layer and the use-case services
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Failures inside the caching path.
///
/// These never leave the orchestrator: every public orchestrator method
/// catches them, logs them, and degrades to a miss or a no-op.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key rejected by the store (empty or too long)
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Value could not be converted to or from its stored form
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backing store misbehaved
    #[error("Cache backend error: {0}")]
    Backend(String),
}

// == Service Error Enum ==
/// Failures reported by domain collaborators and use-case validation.
///
/// The use-case services turn these into response envelopes; callers only
/// ever see the rendered message.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Request failed validation before any collaborator was called
    #[error("{0}")]
    Validation(String),

    /// Caller lacks the permission required for the operation
    #[error("User {user_id} does not have permission to {operation}")]
    PermissionDenied { user_id: String, operation: String },

    /// Requested entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Mutation conflicts with current state
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Downstream storage could not be reached
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Anything else a collaborator wants to surface
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ServiceError {
    /// Shorthand for a permission failure.
    pub fn permission_denied(user_id: impl Into<String>, operation: impl Into<String>) -> Self {
        ServiceError::PermissionDenied {
            user_id: user_id.into(),
            operation: operation.into(),
        }
    }
}

// == Result Type Aliases ==
/// Result of a cache-layer operation.
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Result of a domain collaborator call.
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
