//! Domain-level error types.

use thiserror::Error;
use uuid::Uuid;

/// Coarse classification of a [`DomainError`] for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    Invalid,
    Unauthenticated,
    StoreUnavailable,
}

/// Domain errors - business logic failures.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: &'static str, id: Uuid },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Validation failed: {0}")]
    Invalid(String),

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Backing store unavailable: {0}")]
    StoreUnavailable(String),
}

impl DomainError {
    pub fn post_not_found(id: Uuid) -> Self {
        Self::NotFound {
            entity_type: "Post",
            id,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::NotFound { .. } => ErrorKind::NotFound,
            DomainError::Forbidden(_) => ErrorKind::Forbidden,
            DomainError::Invalid(_) => ErrorKind::Invalid,
            DomainError::Unauthenticated => ErrorKind::Unauthenticated,
            DomainError::StoreUnavailable(_) => ErrorKind::StoreUnavailable,
        }
    }
}

/// Repository-level errors.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Query execution failed: {0}")]
    Query(String),

    #[error("Entity not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

impl From<RepoError> for DomainError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Constraint(msg) => DomainError::Invalid(msg),
            other => DomainError::StoreUnavailable(other.to_string()),
        }
    }
}
