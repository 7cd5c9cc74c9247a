//! Engine errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// The constraint system has no solution. Carries the names of the
    /// clause sources (structural groups, hard constraints) that could not
    /// be satisfied, mirroring spec.md §7's "minimal conflict set of
    /// constraint names".
    #[error("infeasible: {0:?}")]
    Infeasible(Vec<String>),

    /// Solve was cancelled by an abort request before completion.
    #[error("aborted: {0}")]
    Aborted(String),

    #[error(transparent)]
    Constraint(#[from] rsched_constraints::ConstraintError),

    #[error(transparent)]
    Domain(#[from] rsched_domain::DomainError),

    #[error(transparent)]
    Cache(#[from] rsched_cache::CacheError),

    #[error(transparent)]
    Foundation(#[from] rsched_foundation::FoundationError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
