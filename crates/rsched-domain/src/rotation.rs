//! RotationTemplate entity: named rotations such as "FMIT" or "Neurology Selective".

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::block::TimeOfDay;
use crate::person::PersonType;

/// A named rotation a person can be assigned to for a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationTemplate {
    pub id: Uuid,
    pub activity_type: String,
    pub abbreviation: String,
    pub clinic_location: Option<String>,
    pub max_residents: Option<u32>,
    pub required_specialties: BTreeSet<String>,
    pub requires_procedure_credential: bool,
    pub supervision_required: bool,
    pub max_supervision_ratio: u32,
    pub is_archived: bool,
    /// Restricts which person types may ever fill this rotation; empty
    /// means no restriction. Used by the pruner (spec.md §4.8).
    pub allowed_person_types: BTreeSet<PersonType>,
    pub min_pgy: Option<u8>,
    pub max_pgy: Option<u8>,
    /// If set, every block filled by this rotation must match this
    /// time-of-day (spec.md §4.8, "time_of_day_mismatch").
    pub fixed_time_of_day: Option<TimeOfDay>,
}

impl RotationTemplate {
    pub fn new(id: Uuid, activity_type: impl Into<String>, abbreviation: impl Into<String>) -> Self {
        Self {
            id,
            activity_type: activity_type.into(),
            abbreviation: abbreviation.into(),
            clinic_location: None,
            max_residents: None,
            required_specialties: BTreeSet::new(),
            requires_procedure_credential: false,
            supervision_required: false,
            max_supervision_ratio: 4,
            is_archived: false,
            allowed_person_types: BTreeSet::new(),
            min_pgy: None,
            max_pgy: None,
            fixed_time_of_day: None,
        }
    }
}
