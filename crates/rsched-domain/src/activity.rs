//! Activity catalog: the work codes that drive patterns and requirements.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category an activity belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityCategory {
    Clinical,
    Education,
    Administrative,
    TimeOff,
}

/// A catalog entry for a unit of work (`fm_clinic`, `lec`, `advising`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: Uuid,
    pub code: String,
    pub display_abbreviation: String,
    pub category: ActivityCategory,
}

impl Activity {
    pub fn new(
        id: Uuid,
        code: impl Into<String>,
        display_abbreviation: impl Into<String>,
        category: ActivityCategory,
    ) -> Self {
        Self {
            id,
            code: code.into(),
            display_abbreviation: display_abbreviation.into(),
            category,
        }
    }

    pub fn is_time_off(&self) -> bool {
        self.category == ActivityCategory::TimeOff
    }
}
