//! Block entity: the half-day scheduling atom.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Morning or afternoon half-day session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TimeOfDay {
    Am,
    Pm,
}

/// A single half-day scheduling unit, unique in `(date, time_of_day)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: Uuid,
    pub date: NaiveDate,
    pub time_of_day: TimeOfDay,
    /// 1-13 academic block index.
    pub block_number: u8,
    pub is_weekend: bool,
    pub is_holiday: bool,
    pub holiday_name: Option<String>,
}

impl Block {
    pub fn new(id: Uuid, date: NaiveDate, time_of_day: TimeOfDay, block_number: u8) -> Self {
        use chrono::Weekday;
        let is_weekend = matches!(date.weekday(), Weekday::Sat | Weekday::Sun);
        Self {
            id,
            date,
            time_of_day,
            block_number,
            is_weekend,
            is_holiday: false,
            holiday_name: None,
        }
    }

    pub fn with_holiday(mut self, name: impl Into<String>) -> Self {
        self.is_holiday = true;
        self.holiday_name = Some(name.into());
        self
    }

    /// Key identifying this block's (date, time_of_day) pair, used to
    /// enforce the `unique_block_per_half_day` constraint.
    pub fn half_day_key(&self) -> (NaiveDate, TimeOfDay) {
        (self.date, self.time_of_day)
    }

    pub fn weekday_index(&self) -> u8 {
        // Monday = 0 .. Sunday = 6, matching spec.md's day_of_week domain.
        self.date.weekday().num_days_from_monday() as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weekend_detected_from_date() {
        // 2026-07-25 is a Saturday.
        let date = NaiveDate::from_ymd_opt(2026, 7, 25).unwrap();
        let b = Block::new(Uuid::new_v4(), date, TimeOfDay::Am, 1);
        assert!(b.is_weekend);
    }

    #[test]
    fn weekday_index_monday_is_zero() {
        // 2026-07-27 is a Monday.
        let date = NaiveDate::from_ymd_opt(2026, 7, 27).unwrap();
        let b = Block::new(Uuid::new_v4(), date, TimeOfDay::Am, 1);
        assert_eq!(b.weekday_index(), 0);
        assert!(!b.is_weekend);
    }
}
