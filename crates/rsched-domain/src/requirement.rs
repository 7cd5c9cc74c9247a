//! RotationActivityRequirement entity: the L2 layer, defining how many of
//! each activity a rotation demands.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::error::{DomainError, Result};

/// A week subset within a 4-week rotation block; `None` means "all four
/// weeks". Represented as a sorted set to make the `applicable_weeks_hash`
/// deterministic.
pub type ApplicableWeeks = Option<BTreeSet<u8>>;

/// Namespace UUID used to derive `applicable_weeks_hash` via UUID v5. Fixed
/// so that the hash is stable across runs and implementations, per
/// spec.md §3's `uq_rotation_activity_req` uniqueness constraint.
const APPLICABLE_WEEKS_NAMESPACE: Uuid = Uuid::from_bytes([
    0x6f, 0xf9, 0x2b, 0x63, 0x6b, 0x9a, 0x4a, 0x7e, 0x9e, 0x3d, 0x0a, 0x46, 0x5a, 0x9d, 0x1f, 0x02,
]);

/// Bounds on how many half-days of `activity_id` a rotation requires over
/// `applicable_weeks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationActivityRequirement {
    pub id: Uuid,
    pub rotation_template_id: Uuid,
    pub activity_id: Uuid,
    pub min_halfdays: u32,
    pub max_halfdays: u32,
    pub target_halfdays: u32,
    pub applicable_weeks: ApplicableWeeks,
    pub applicable_weeks_hash: Uuid,
    pub prefer_full_days: bool,
    pub preferred_days: BTreeSet<u8>,
    pub avoid_days: BTreeSet<u8>,
    /// 0-100; values 91-100 are treated as near-hard by the engine.
    pub priority: u8,
}

impl RotationActivityRequirement {
    pub fn new(
        id: Uuid,
        rotation_template_id: Uuid,
        activity_id: Uuid,
        min_halfdays: u32,
        max_halfdays: u32,
        target_halfdays: u32,
        applicable_weeks: ApplicableWeeks,
        priority: u8,
    ) -> Result<Self> {
        if min_halfdays > max_halfdays {
            return Err(DomainError::Validation(format!(
                "min_halfdays ({min_halfdays}) exceeds max_halfdays ({max_halfdays})"
            )));
        }
        if target_halfdays < min_halfdays || target_halfdays > max_halfdays {
            return Err(DomainError::Validation(format!(
                "target_halfdays ({target_halfdays}) must lie within [{min_halfdays}, {max_halfdays}]"
            )));
        }
        if priority > 100 {
            return Err(DomainError::Validation(format!(
                "priority must be 0-100, got {priority}"
            )));
        }
        let applicable_weeks_hash =
            Self::compute_weeks_hash(rotation_template_id, activity_id, &applicable_weeks);
        Ok(Self {
            id,
            rotation_template_id,
            activity_id,
            min_halfdays,
            max_halfdays,
            target_halfdays,
            applicable_weeks,
            applicable_weeks_hash,
            prefer_full_days: false,
            preferred_days: BTreeSet::new(),
            avoid_days: BTreeSet::new(),
            priority,
        })
    }

    /// A requirement with priority 91-100 is treated as near-hard: the
    /// solver should prefer infeasibility over dropping it.
    pub fn is_near_hard(&self) -> bool {
        self.priority >= 91
    }

    fn compute_weeks_hash(
        rotation_template_id: Uuid,
        activity_id: Uuid,
        weeks: &ApplicableWeeks,
    ) -> Uuid {
        let weeks_repr = match weeks {
            None => "all".to_string(),
            Some(set) => set
                .iter()
                .map(|w| w.to_string())
                .collect::<Vec<_>>()
                .join(","),
        };
        let name = format!("{rotation_template_id}:{activity_id}:{weeks_repr}");
        Uuid::new_v5(&APPLICABLE_WEEKS_NAMESPACE, name.as_bytes())
    }

    /// Scope uniqueness key: `(rotation_template_id, activity_id,
    /// applicable_weeks_hash)`, matching `uq_rotation_activity_req`.
    pub fn scope_key(&self) -> (Uuid, Uuid, Uuid) {
        (
            self.rotation_template_id,
            self.activity_id,
            self.applicable_weeks_hash,
        )
    }

    pub fn applies_to_week(&self, week: u8) -> bool {
        match &self.applicable_weeks {
            None => true,
            Some(set) => set.contains(&week),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_min_greater_than_max() {
        let r = RotationActivityRequirement::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            3,
            2,
            2,
            None,
            50,
        );
        assert!(r.is_err());
    }

    #[test]
    fn weeks_hash_is_deterministic_and_scope_sensitive() {
        let rot = Uuid::new_v4();
        let act = Uuid::new_v4();
        let a = RotationActivityRequirement::new(
            Uuid::new_v4(),
            rot,
            act,
            1,
            2,
            2,
            Some(BTreeSet::from([1, 2])),
            50,
        )
        .unwrap();
        let b = RotationActivityRequirement::new(
            Uuid::new_v4(),
            rot,
            act,
            1,
            2,
            2,
            Some(BTreeSet::from([2, 1])),
            50,
        )
        .unwrap();
        // Order of insertion doesn't matter: BTreeSet normalizes it.
        assert_eq!(a.applicable_weeks_hash, b.applicable_weeks_hash);

        let c = RotationActivityRequirement::new(
            Uuid::new_v4(),
            rot,
            act,
            1,
            2,
            2,
            Some(BTreeSet::from([1, 3])),
            50,
        )
        .unwrap();
        assert_ne!(a.applicable_weeks_hash, c.applicable_weeks_hash);
    }

    #[test]
    fn near_hard_threshold() {
        let r = RotationActivityRequirement::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            1,
            2,
            2,
            None,
            91,
        )
        .unwrap();
        assert!(r.is_near_hard());
    }
}
