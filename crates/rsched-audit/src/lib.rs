//! Override engine and tamper-evident hash-chain audit trail (spec.md §4.5).
//!
//! - `chain`: genesis/append/verify for the `ApprovalRecord` hash chain.
//! - `override_engine`: eligibility rules for `apply_override` and the
//!   `ApprovalAction` each override type maps to.

pub mod chain;
pub mod error;
pub mod override_engine;

pub use chain::{append, compute_hash, create_genesis, verify_chain, verify_hash, AppendRequest, ChainVerification};
pub use error::{AuditError, Result};
pub use override_engine::{action_for, apply_override, protected_activity_codes, ApplyOverrideRequest, ConflictingBooking};
