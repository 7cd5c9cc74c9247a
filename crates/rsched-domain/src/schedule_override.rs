//! ScheduleOverride entity: post-release modification of a released Assignment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::block::TimeOfDay;
use crate::error::{DomainError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideType {
    Coverage,
    Cancellation,
    Gap,
}

/// A post-release modification of an `Assignment`: a coverage swap,
/// cancellation, or gap fill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleOverride {
    pub id: Uuid,
    pub assignment_id: Uuid,
    pub override_type: OverrideType,
    pub original_person_id: Uuid,
    pub replacement_person_id: Option<Uuid>,
    pub effective_date: chrono::NaiveDate,
    pub effective_time_of_day: TimeOfDay,
    pub reason: String,
    pub is_active: bool,
    pub supersedes_override_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub deactivated_at: Option<DateTime<Utc>>,
    pub deactivated_by: Option<Uuid>,
}

impl ScheduleOverride {
    /// Construct a coverage override. `replacement_person_id` must differ
    /// from `original_person_id` — this is checked here, but the full
    /// eligibility rules (existing-booking conflicts, protected-activity
    /// rejection) live in the override engine, which has access to the
    /// activity and other active overrides.
    pub fn coverage(
        id: Uuid,
        assignment_id: Uuid,
        original_person_id: Uuid,
        replacement_person_id: Uuid,
        effective_date: chrono::NaiveDate,
        effective_time_of_day: TimeOfDay,
        reason: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        if replacement_person_id == original_person_id {
            return Err(DomainError::Validation(
                "replacement person must differ from original person".to_string(),
            ));
        }
        Ok(Self {
            id,
            assignment_id,
            override_type: OverrideType::Coverage,
            original_person_id,
            replacement_person_id: Some(replacement_person_id),
            effective_date,
            effective_time_of_day,
            reason: reason.into(),
            is_active: true,
            supersedes_override_id: None,
            created_at: now,
            deactivated_at: None,
            deactivated_by: None,
        })
    }

    pub fn cancellation(
        id: Uuid,
        assignment_id: Uuid,
        original_person_id: Uuid,
        effective_date: chrono::NaiveDate,
        effective_time_of_day: TimeOfDay,
        reason: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            assignment_id,
            override_type: OverrideType::Cancellation,
            original_person_id,
            replacement_person_id: None,
            effective_date,
            effective_time_of_day,
            reason: reason.into(),
            is_active: true,
            supersedes_override_id: None,
            created_at: now,
            deactivated_at: None,
            deactivated_by: None,
        }
    }

    pub fn gap(
        id: Uuid,
        assignment_id: Uuid,
        original_person_id: Uuid,
        effective_date: chrono::NaiveDate,
        effective_time_of_day: TimeOfDay,
        reason: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            assignment_id,
            override_type: OverrideType::Gap,
            original_person_id,
            replacement_person_id: None,
            effective_date,
            effective_time_of_day,
            reason: reason.into(),
            is_active: true,
            supersedes_override_id: None,
            created_at: now,
            deactivated_at: None,
            deactivated_by: None,
        }
    }

    pub fn deactivate(&mut self, by: Uuid, now: DateTime<Utc>) {
        self.is_active = false;
        self.deactivated_at = Some(now);
        self.deactivated_by = Some(by);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coverage_requires_distinct_replacement() {
        let person = Uuid::new_v4();
        let result = ScheduleOverride::coverage(
            Uuid::new_v4(),
            Uuid::new_v4(),
            person,
            person,
            chrono::NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            TimeOfDay::Am,
            "self-cover",
            Utc::now(),
        );
        assert!(result.is_err());
    }
}
