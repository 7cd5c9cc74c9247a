//! Entities and invariants for the residency scheduling core.
//!
//! This crate provides the data model shared across the constraint
//! library, the hybrid layer engine, and the audit chain:
//! - People and their credentials (`person`, `credential`)
//! - Scheduling primitives: blocks, activities, rotations (`block`,
//!   `activity`, `rotation`)
//! - The L1/L2 hybrid layer shape: protected weekly patterns and
//!   activity-requirement bounds (`pattern`, `requirement`)
//! - Scheduled facts: assignments, absences, call coverage
//!   (`assignment`, `absence`)
//! - Post-release modifications and their audit trail (`schedule_override`,
//!   `approval`)
//! - The read-only aggregate view threaded through constraint evaluation
//!   (`context`)

pub mod absence;
pub mod activity;
pub mod approval;
pub mod assignment;
pub mod block;
pub mod context;
pub mod credential;
pub mod error;
pub mod pattern;
pub mod person;
pub mod requirement;
pub mod rotation;
pub mod schedule_override;

pub use absence::{Absence, AbsenceType, CallAssignment, CallType};
pub use activity::{Activity, ActivityCategory};
pub use approval::{ActorType, ApprovalAction, ApprovalRecord};
pub use assignment::{Assignment, AssignmentRole};
pub use block::{Block, TimeOfDay};
pub use context::{ResilienceData, SchedulingContext};
pub use credential::{Credential, CredentialStatus};
pub use error::{DomainError, Result};
pub use pattern::WeeklyPattern;
pub use person::{FacultyRole, Person, PersonType, Pgy};
pub use requirement::{ApplicableWeeks, RotationActivityRequirement};
pub use rotation::RotationTemplate;
pub use schedule_override::{OverrideType, ScheduleOverride};
