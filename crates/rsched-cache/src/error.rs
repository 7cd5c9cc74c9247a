//! Cache errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error(transparent)]
    Foundation(#[from] rsched_foundation::FoundationError),
}

pub type Result<T> = std::result::Result<T, CacheError>;
