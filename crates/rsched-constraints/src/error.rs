//! Errors raised while assembling or meta-validating a constraint set.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConstraintError {
    #[error("duplicate constraint name: {0}")]
    DuplicateName(String),

    #[error("constraint configuration invalid: {0}")]
    InvalidConfiguration(String),

    #[error(transparent)]
    Domain(#[from] rsched_domain::DomainError),
}

pub type Result<T> = std::result::Result<T, ConstraintError>;
