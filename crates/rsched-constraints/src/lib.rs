//! Polymorphic constraint library, constraint manager, and validator for
//! the residency scheduling core.
//!
//! - `constraint`: the `Constraint` trait and its tag types.
//! - `model`: the solver-agnostic clause/variable surface constraints
//!   write into.
//! - `rules`: the standard ACGME and institutional constraints.
//! - `manager`: `ConstraintManager` (composition) and `ConstraintValidator`
//!   (meta-validation of a constraint set).
//! - `validator`: the standalone scoring `Validator`.

pub mod constraint;
pub mod error;
pub mod manager;
pub mod model;
pub mod rules;
pub mod severity;
pub mod validator;
pub mod violation;

pub use constraint::{Constraint, ConstraintPriority, ConstraintResult, ConstraintType, Description};
pub use error::{ConstraintError, Result};
pub use manager::{ConstraintManager, ConstraintValidator, MetaValidationReport};
pub use model::{Clause, DecisionVars, ModelSink, VarId};
pub use rules::{
    DutyHoursConstraint, OneInSevenRule, PostFmitSundayBlocking, ResidentInpatientHeadcount,
    SequenceConstraint, SupervisionRatio,
};
pub use severity::Severity;
pub use validator::{ScoreComponents, ScoredValidation, ValidationReport, Validator};
pub use violation::Violation;
