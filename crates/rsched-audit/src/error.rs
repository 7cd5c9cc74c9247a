//! Audit and override errors.

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("assignment {0} not found")]
    AssignmentNotFound(Uuid),

    #[error("activity for assignment {0} not found")]
    ActivityNotFound(Uuid),

    #[error("cannot cancel a protected activity ({0})")]
    ProtectedActivity(String),

    #[error("cannot override a time-off assignment")]
    TimeOffOverride,

    #[error("an active override already exists for assignment {0}")]
    ActiveOverrideExists(Uuid),

    #[error("replacement person required for coverage override")]
    ReplacementRequired,

    #[error("replacement person {0} is already booked for this half-day")]
    ReplacementConflict(Uuid),

    #[error("append with (chain_id={chain_id}, sequence_num={sequence_num}) conflicts with an existing record")]
    DuplicateSequence { chain_id: String, sequence_num: u64 },

    #[error(transparent)]
    Domain(#[from] rsched_domain::DomainError),

    #[error(transparent)]
    Foundation(#[from] rsched_foundation::FoundationError),
}

pub type Result<T> = std::result::Result<T, AuditError>;
