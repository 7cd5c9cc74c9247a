//! WeeklyPattern entity: the L1 layer, defining where activities go.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::block::TimeOfDay;

/// A `(rotation_template, day_of_week, time_of_day) -> activity` rule.
///
/// When `is_protected` is true the solver can never change the resulting
/// assignment — see the Hybrid Layer Engine, L1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyPattern {
    pub id: Uuid,
    pub rotation_template_id: Uuid,
    /// 0 = Monday .. 6 = Sunday.
    pub day_of_week: u8,
    pub time_of_day: TimeOfDay,
    pub activity_id: Uuid,
    pub is_protected: bool,
    pub linked_template_id: Option<Uuid>,
}

impl WeeklyPattern {
    pub fn new(
        id: Uuid,
        rotation_template_id: Uuid,
        day_of_week: u8,
        time_of_day: TimeOfDay,
        activity_id: Uuid,
    ) -> Self {
        Self {
            id,
            rotation_template_id,
            day_of_week: day_of_week % 7,
            time_of_day,
            activity_id,
            is_protected: false,
            linked_template_id: None,
        }
    }

    pub fn protected(mut self) -> Self {
        self.is_protected = true;
        self
    }

    /// Key enforcing the `(template, day, time)` uniqueness invariant.
    pub fn key(&self) -> (Uuid, u8, TimeOfDay) {
        (self.rotation_template_id, self.day_of_week, self.time_of_day)
    }
}
