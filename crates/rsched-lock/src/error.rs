//! Lock errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LockError {
    #[error("could not acquire lock for key {key} within {timeout_secs}s; another run may already be in progress")]
    AcquisitionTimeout { key: String, timeout_secs: u64 },

    #[error("lock backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error(transparent)]
    Foundation(#[from] rsched_foundation::FoundationError),
}

pub type Result<T> = std::result::Result<T, LockError>;
