//! Repository Interface (spec.md §4.9): the abstract store every entity
//! in `rsched-domain` is persisted through. The core depends only on this
//! trait; storage choice (relational, embedded, etc.) is an
//! implementation concern external to the crate.
//!
//! `InMemoryRepository` is a usable reference implementation — not test
//! scaffolding gated behind `cfg(test)` — so `rsched-engine` and
//! `rsched-core` are exercisable without a real store, the same pattern
//! the teacher uses for `rh_foundation::Config` plus concrete configs.

pub mod error;
pub mod in_memory;

pub use error::{RepositoryError, Result};
pub use in_memory::InMemoryRepository;

use chrono::NaiveDate;
use uuid::Uuid;

use rsched_domain::{
    Activity, ApprovalRecord, Assignment, Block, Credential, RotationTemplate, ScheduleOverride,
    SchedulingContext,
};

/// The abstract store of every entity the core reads and writes.
pub trait Repository: Send + Sync {
    /// Returns every persons, blocks, templates, existing assignments,
    /// absences, patterns, requirements, call assignments, and
    /// credentials falling within `date_range`, assembled into a
    /// read-only `SchedulingContext` (spec.md §4.9).
    fn load_context(&self, date_range: (NaiveDate, NaiveDate)) -> Result<SchedulingContext>;

    /// Idempotent write: replaces any prior write for the same `run_id`
    /// transactionally (spec.md §4.9).
    fn write_assignments(&self, run_id: Uuid, assignments: Vec<Assignment>) -> Result<()>;

    /// Uniqueness enforced on `(chain_id, sequence_num)`; a retry with the
    /// same pair fails with `Conflict` rather than double-inserting
    /// (spec.md §8.2).
    fn append_approval(&self, record: ApprovalRecord) -> Result<()>;

    /// Ordered by `sequence_num`.
    fn read_chain(&self, chain_id: &str) -> Result<Vec<ApprovalRecord>>;

    fn get_assignment(&self, id: Uuid) -> Result<Assignment>;
    fn get_activity(&self, id: Uuid) -> Result<Activity>;
    fn get_block(&self, id: Uuid) -> Result<Block>;
    fn get_rotation_template(&self, id: Uuid) -> Result<RotationTemplate>;
    fn get_credential(&self, person_id: Uuid, procedure: &str) -> Result<Option<Credential>>;

    /// The active override on `assignment_id`, if one exists.
    fn active_override_for_assignment(&self, assignment_id: Uuid) -> Result<Option<ScheduleOverride>>;

    /// An assignment already booking `person_id` at `(date, time_of_day)`,
    /// other than `exclude_assignment_id` — used by the coverage-override
    /// conflict check (spec.md §4.5.1 step 4).
    fn booking_for_person_at(
        &self,
        person_id: Uuid,
        date: NaiveDate,
        time_of_day: rsched_domain::TimeOfDay,
        exclude_assignment_id: Uuid,
    ) -> Result<Option<Assignment>>;

    fn write_override(&self, override_record: ScheduleOverride) -> Result<()>;
    fn deactivate_override(&self, id: Uuid, by: Uuid, now: chrono::DateTime<chrono::Utc>) -> Result<()>;
    fn get_override(&self, id: Uuid) -> Result<ScheduleOverride>;
}
