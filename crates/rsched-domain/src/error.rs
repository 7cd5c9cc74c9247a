//! Domain error types.

use rsched_foundation::FoundationError;
use thiserror::Error;

/// Errors raised while constructing or validating domain entities.
#[derive(Error, Debug)]
pub enum DomainError {
    /// A required invariant on an entity was violated at construction time.
    #[error("invariant violated: {0}")]
    Invariant(String),

    /// Input was structurally fine but semantically invalid (date ordering,
    /// PGY level out of range, etc).
    #[error("validation failed: {0}")]
    Validation(String),

    /// Foundation error (covers IO, JSON, etc).
    #[error(transparent)]
    Foundation(#[from] FoundationError),
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::Foundation(FoundationError::Serialization(err))
    }
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;
