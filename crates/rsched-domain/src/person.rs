//! Person entity: residents and faculty.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::error::{DomainError, Result};

/// Whether a person is a resident (subject to PGY-level rules) or faculty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonType {
    Resident,
    Faculty,
}

/// Postgraduate year, 1 through 3. Residents only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pgy(u8);

impl Pgy {
    pub fn new(level: u8) -> Result<Self> {
        if !(1..=3).contains(&level) {
            return Err(DomainError::Validation(format!(
                "PGY level must be 1-3, got {level}"
            )));
        }
        Ok(Self(level))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

/// Administrative role held by faculty. Residents never carry one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacultyRole {
    Pd,
    Apd,
    Oic,
    DeptChief,
    SportsMed,
    Core,
}

/// A resident or faculty member who can be assigned to a half-day block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: Uuid,
    pub person_type: PersonType,
    pgy_level: Option<Pgy>,
    pub email: String,
    pub specialties: BTreeSet<String>,
    pub performs_procedures: bool,
    pub faculty_role: Option<FacultyRole>,
}

impl Person {
    /// Build a resident. `pgy` must be 1-3.
    pub fn resident(
        id: Uuid,
        email: impl Into<String>,
        pgy: u8,
        specialties: BTreeSet<String>,
        performs_procedures: bool,
    ) -> Result<Self> {
        Ok(Self {
            id,
            person_type: PersonType::Resident,
            pgy_level: Some(Pgy::new(pgy)?),
            email: email.into(),
            specialties,
            performs_procedures,
            faculty_role: None,
        })
    }

    /// Build a faculty member. `faculty_role` is optional.
    pub fn faculty(
        id: Uuid,
        email: impl Into<String>,
        specialties: BTreeSet<String>,
        performs_procedures: bool,
        faculty_role: Option<FacultyRole>,
    ) -> Self {
        Self {
            id,
            person_type: PersonType::Faculty,
            pgy_level: None,
            email: email.into(),
            specialties,
            performs_procedures,
            faculty_role,
        }
    }

    pub fn pgy_level(&self) -> Option<Pgy> {
        self.pgy_level
    }

    pub fn is_resident(&self) -> bool {
        self.person_type == PersonType::Resident
    }

    pub fn has_specialty(&self, specialty: &str) -> bool {
        self.specialties.contains(specialty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resident_requires_valid_pgy() {
        let id = Uuid::new_v4();
        assert!(Person::resident(id, "a@b.c", 0, BTreeSet::new(), false).is_err());
        assert!(Person::resident(id, "a@b.c", 4, BTreeSet::new(), false).is_err());
        assert!(Person::resident(id, "a@b.c", 2, BTreeSet::new(), false).is_ok());
    }

    #[test]
    fn faculty_has_no_pgy() {
        let id = Uuid::new_v4();
        let f = Person::faculty(id, "f@b.c", BTreeSet::new(), false, Some(FacultyRole::Pd));
        assert_eq!(f.pgy_level(), None);
        assert!(!f.is_resident());
    }
}
