//! Assignment entity: the scheduled fact linking a person to a block.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A person's role on a given assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentRole {
    Primary,
    Supervising,
    Backup,
}

/// The scheduled fact: `(block, person)` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: Uuid,
    pub block_id: Uuid,
    pub person_id: Uuid,
    pub rotation_template_id: Option<Uuid>,
    pub activity_id: Uuid,
    pub role: AssignmentRole,
    /// Non-null only when an activity differs from the rotation's usual
    /// weekly-pattern activity for this slot.
    pub activity_override: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Optimistic-concurrency token: overrides on the same assignment must
    /// read this before writing (spec.md §5).
    pub updated_at: DateTime<Utc>,
}

impl Assignment {
    pub fn new(
        id: Uuid,
        block_id: Uuid,
        person_id: Uuid,
        rotation_template_id: Option<Uuid>,
        activity_id: Uuid,
        role: AssignmentRole,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            block_id,
            person_id,
            rotation_template_id,
            activity_id,
            role,
            activity_override: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Key enforcing the `unique_person_per_block` invariant.
    pub fn occupancy_key(&self) -> (Uuid, Uuid) {
        (self.block_id, self.person_id)
    }

    pub fn effective_activity_id(&self) -> Uuid {
        self.activity_override.unwrap_or(self.activity_id)
    }
}
