//! Override engine: `apply_override` (spec.md §4.5.1).
//!
//! This module is pure: callers (the repository-backed facade in
//! `rsched-core`) are responsible for loading the assignment, its
//! activity, any existing active override, and any conflicting booking,
//! then handing them here for the actual eligibility decision.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use rsched_domain::{Activity, ActivityCategory, Assignment, ApprovalAction, Block, OverrideType, ScheduleOverride};

use crate::error::{AuditError, Result};

/// Display abbreviations that can never be cancelled, matched
/// case-insensitively (spec.md §9 Open Questions: this set is encoded
/// from the source's current behavior and may need to be data-driven).
pub fn protected_activity_codes() -> BTreeSet<&'static str> {
    BTreeSet::from(["FMIT", "PCAT", "DO"])
}

fn is_protected(activity: &Activity) -> bool {
    protected_activity_codes().contains(activity.display_abbreviation.to_uppercase().as_str())
}

/// An existing booking that would conflict with a coverage replacement,
/// and whether that booking is itself shielded by an active
/// cancellation/gap override (in which case it is not a conflict).
pub struct ConflictingBooking {
    pub assignment_id: Uuid,
    pub shielded_by_active_override: bool,
}

pub struct ApplyOverrideRequest<'a> {
    pub assignment: &'a Assignment,
    pub activity: &'a Activity,
    pub block: &'a Block,
    pub override_type: OverrideType,
    pub replacement_person_id: Option<Uuid>,
    pub reason: String,
    pub existing_active_override: Option<Uuid>,
    pub replacement_conflict: Option<ConflictingBooking>,
    pub supersedes_override_id: Option<Uuid>,
    pub now: DateTime<Utc>,
}

/// Runs the five eligibility checks from spec.md §4.5.1 steps 2-4 and
/// constructs the override record (step 5). Step 6 (appending the
/// `ApprovalRecord`) is the caller's responsibility once this succeeds,
/// using `action_for`.
pub fn apply_override(id: Uuid, req: ApplyOverrideRequest<'_>) -> Result<ScheduleOverride> {
    if matches!(req.override_type, OverrideType::Cancellation) && is_protected(req.activity) {
        return Err(AuditError::ProtectedActivity(req.activity.display_abbreviation.clone()));
    }
    if req.activity.category == ActivityCategory::TimeOff {
        return Err(AuditError::TimeOffOverride);
    }
    if let Some(existing) = req.existing_active_override {
        return Err(AuditError::ActiveOverrideExists(existing));
    }

    match req.override_type {
        OverrideType::Coverage => {
            let replacement = req
                .replacement_person_id
                .ok_or(AuditError::ReplacementRequired)?;
            if let Some(conflict) = &req.replacement_conflict {
                if !conflict.shielded_by_active_override {
                    return Err(AuditError::ReplacementConflict(conflict.assignment_id));
                }
            }
            let mut override_record = ScheduleOverride::coverage(
                id,
                req.assignment.id,
                req.assignment.person_id,
                replacement,
                req.block.date,
                req.block.time_of_day,
                req.reason,
                req.now,
            )?;
            override_record.supersedes_override_id = req.supersedes_override_id;
            Ok(override_record)
        }
        OverrideType::Cancellation => {
            let mut override_record = ScheduleOverride::cancellation(
                id,
                req.assignment.id,
                req.assignment.person_id,
                req.block.date,
                req.block.time_of_day,
                req.reason,
                req.now,
            );
            override_record.supersedes_override_id = req.supersedes_override_id;
            Ok(override_record)
        }
        OverrideType::Gap => {
            let mut override_record = ScheduleOverride::gap(
                id,
                req.assignment.id,
                req.assignment.person_id,
                req.block.date,
                req.block.time_of_day,
                req.reason,
                req.now,
            );
            override_record.supersedes_override_id = req.supersedes_override_id;
            Ok(override_record)
        }
    }
}

/// The `ApprovalAction` derived from an override type, for the audit
/// record appended in step 6.
pub fn action_for(override_type: OverrideType) -> ApprovalAction {
    match override_type {
        OverrideType::Coverage => ApprovalAction::CoverageOverrideApplied,
        OverrideType::Cancellation => ApprovalAction::CancellationOverrideApplied,
        OverrideType::Gap => ApprovalAction::GapOverrideApplied,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsched_domain::{ActivityCategory, AssignmentRole, TimeOfDay};

    fn sample_activity(abbr: &str, category: ActivityCategory) -> Activity {
        Activity::new(Uuid::new_v4(), abbr.to_lowercase(), abbr, category)
    }

    fn sample_assignment() -> Assignment {
        Assignment::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            None,
            Uuid::new_v4(),
            AssignmentRole::Primary,
            Utc::now(),
        )
    }

    fn sample_block() -> Block {
        Block::new(Uuid::new_v4(), Utc::now().date_naive(), TimeOfDay::Am, 1)
    }

    #[test]
    fn rejects_cancellation_of_protected_activity() {
        let assignment = sample_assignment();
        let activity = sample_activity("FMIT", ActivityCategory::Clinical);
        let block = sample_block();
        let result = apply_override(
            Uuid::new_v4(),
            ApplyOverrideRequest {
                assignment: &assignment,
                activity: &activity,
                block: &block,
                override_type: OverrideType::Cancellation,
                replacement_person_id: None,
                reason: "test".to_string(),
                existing_active_override: None,
                replacement_conflict: None,
                supersedes_override_id: None,
                now: Utc::now(),
            },
        );
        assert!(matches!(result, Err(AuditError::ProtectedActivity(_))));
    }

    #[test]
    fn rejects_override_of_time_off() {
        let assignment = sample_assignment();
        let activity = sample_activity("VAC", ActivityCategory::TimeOff);
        let block = sample_block();
        let result = apply_override(
            Uuid::new_v4(),
            ApplyOverrideRequest {
                assignment: &assignment,
                activity: &activity,
                block: &block,
                override_type: OverrideType::Gap,
                replacement_person_id: None,
                reason: "test".to_string(),
                existing_active_override: None,
                replacement_conflict: None,
                supersedes_override_id: None,
                now: Utc::now(),
            },
        );
        assert!(matches!(result, Err(AuditError::TimeOffOverride)));
    }

    #[test]
    fn rejects_unshielded_replacement_conflict() {
        let assignment = sample_assignment();
        let activity = sample_activity("CLINIC", ActivityCategory::Clinical);
        let block = sample_block();
        let conflict_id = Uuid::new_v4();
        let result = apply_override(
            Uuid::new_v4(),
            ApplyOverrideRequest {
                assignment: &assignment,
                activity: &activity,
                block: &block,
                override_type: OverrideType::Coverage,
                replacement_person_id: Some(Uuid::new_v4()),
                reason: "test".to_string(),
                existing_active_override: None,
                replacement_conflict: Some(ConflictingBooking {
                    assignment_id: conflict_id,
                    shielded_by_active_override: false,
                }),
                supersedes_override_id: None,
                now: Utc::now(),
            },
        );
        assert!(matches!(result, Err(AuditError::ReplacementConflict(id)) if id == conflict_id));
    }

    #[test]
    fn allows_shielded_replacement_conflict() {
        let assignment = sample_assignment();
        let activity = sample_activity("CLINIC", ActivityCategory::Clinical);
        let block = sample_block();
        let result = apply_override(
            Uuid::new_v4(),
            ApplyOverrideRequest {
                assignment: &assignment,
                activity: &activity,
                block: &block,
                override_type: OverrideType::Coverage,
                replacement_person_id: Some(Uuid::new_v4()),
                reason: "test".to_string(),
                existing_active_override: None,
                replacement_conflict: Some(ConflictingBooking {
                    assignment_id: Uuid::new_v4(),
                    shielded_by_active_override: true,
                }),
                supersedes_override_id: None,
                now: Utc::now(),
            },
        );
        assert!(result.is_ok());
    }
}
