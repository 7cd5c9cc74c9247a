//! Absence and CallAssignment entities.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DomainError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsenceType {
    Vacation,
    Deployment,
    Tdy,
    Medical,
    FamilyEmergency,
    Conference,
}

/// A period a person is unavailable for assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Absence {
    pub id: Uuid,
    pub person_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub absence_type: AbsenceType,
    pub is_deployment: bool,
    pub replacement_activity_id: Option<Uuid>,
}

impl Absence {
    pub fn new(
        id: Uuid,
        person_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
        absence_type: AbsenceType,
    ) -> Result<Self> {
        if end_date < start_date {
            return Err(DomainError::Validation(format!(
                "absence end_date {end_date} precedes start_date {start_date}"
            )));
        }
        Ok(Self {
            id,
            person_id,
            start_date,
            end_date,
            absence_type,
            is_deployment: matches!(absence_type, AbsenceType::Deployment),
            replacement_activity_id: None,
        })
    }

    pub fn covers(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }
}

/// Type of call coverage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallType {
    Overnight,
    Weekend,
    Backup,
}

/// A call-coverage fact, unique per `(date, person, call_type)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallAssignment {
    pub id: Uuid,
    pub date: NaiveDate,
    pub person_id: Uuid,
    pub call_type: CallType,
}

impl CallAssignment {
    pub fn new(id: Uuid, date: NaiveDate, person_id: Uuid, call_type: CallType) -> Self {
        Self {
            id,
            date,
            person_id,
            call_type,
        }
    }

    pub fn key(&self) -> (NaiveDate, Uuid, CallType) {
        (self.date, self.person_id, self.call_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_end_before_start() {
        let start = NaiveDate::from_ymd_opt(2026, 1, 10).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let a = Absence::new(Uuid::new_v4(), Uuid::new_v4(), start, end, AbsenceType::Vacation);
        assert!(a.is_err());
    }

    #[test]
    fn covers_inclusive_range() {
        let start = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 1, 10).unwrap();
        let a =
            Absence::new(Uuid::new_v4(), Uuid::new_v4(), start, end, AbsenceType::Vacation).unwrap();
        assert!(a.covers(start));
        assert!(a.covers(end));
        assert!(!a.covers(end.succ_opt().unwrap()));
    }
}
