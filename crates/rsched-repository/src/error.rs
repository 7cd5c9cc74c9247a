//! Repository errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("not found: {0}")]
    NotFound(String),

    /// Uniqueness collision, e.g. a duplicate `(chain_id, sequence_num)`
    /// on `append_approval` (spec.md §4.9).
    #[error("conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Domain(#[from] rsched_domain::DomainError),

    #[error(transparent)]
    Foundation(#[from] rsched_foundation::FoundationError),
}

pub type Result<T> = std::result::Result<T, RepositoryError>;
