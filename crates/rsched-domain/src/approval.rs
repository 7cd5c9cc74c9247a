//! ApprovalRecord entity: one link in a tamper-evident hash chain.
//!
//! The entity shape lives here; the hashing and chain-walking behavior
//! lives in `rsched-audit`, which depends on this crate plus
//! `rsched-foundation::canonical_json`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Who performed the action the record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorType {
    Human,
    System,
    Ai,
}

/// The closed set of actions an approval record can describe. A strict
/// superset of "action derived from override type" (spec.md §4.5.1),
/// matching the original `ApprovalAction` taxonomy in
/// `original_source/backend/app/models/approval_record.py`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalAction {
    ScheduleGenerated,
    ScheduleApproved,
    SchedulePublished,
    ScheduleRejected,
    AssignmentCreated,
    AssignmentModified,
    AssignmentDeleted,
    AcgmeOverrideRequested,
    AcgmeOverrideApproved,
    AcgmeOverrideDenied,
    SwapRequested,
    SwapApproved,
    SwapExecuted,
    SwapRolledBack,
    CoverageOverrideApplied,
    CancellationOverrideApplied,
    GapOverrideApplied,
    OverrideDeactivated,
    Genesis,
    Aborted,
}

impl std::fmt::Display for ApprovalAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| "UNKNOWN".to_string());
        write!(f, "{s}")
    }
}

/// One link in an append-only, hash-linked audit chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalRecord {
    pub id: Uuid,
    pub chain_id: String,
    pub sequence_num: u64,
    pub prev_record_id: Option<Uuid>,
    /// `None` only for the genesis record.
    pub prev_hash: Option<String>,
    pub record_hash: String,
    pub action: ApprovalAction,
    pub payload: Value,
    pub actor_id: Option<Uuid>,
    pub actor_type: ActorType,
    pub reason: Option<String>,
    pub target_entity_type: Option<String>,
    pub target_entity_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}
