//! Constraint pruner (spec.md §4.8): eliminates `(person, block, rotation)`
//! triples that can never satisfy a hard constraint before the solver ever
//! sees them, shrinking the decision-variable pool.
//!
//! Confirmed against `original_source`'s `ConstraintPruner`: the reasons
//! below are exactly its closed set of string tags, the pruner is sound
//! (never drops a triple a feasible solution needs) and incomplete (some
//! infeasible triples survive, caught later by `rsched-constraints`), and
//! `PruningReport::estimated_speedup` mirrors its exponential search-space
//! reduction estimate.

use std::collections::{BTreeMap, HashSet};

use uuid::Uuid;

use rsched_domain::{Person, RotationTemplate, SchedulingContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PruningReason {
    PersonTypeMismatch,
    PgyLevelTooLow,
    PgyLevelTooHigh,
    SpecialtyMismatch,
    PersonUnavailable,
    TimeOfDayMismatch,
}

impl PruningReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            PruningReason::PersonTypeMismatch => "person_type_mismatch",
            PruningReason::PgyLevelTooLow => "pgy_level_too_low",
            PruningReason::PgyLevelTooHigh => "pgy_level_too_high",
            PruningReason::SpecialtyMismatch => "specialty_mismatch",
            PruningReason::PersonUnavailable => "person_unavailable",
            PruningReason::TimeOfDayMismatch => "time_of_day_mismatch",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PruningReport {
    pub pruned_count: usize,
    pub total_evaluated: usize,
    pub remaining_count: usize,
    pub reasons: BTreeMap<PruningReason, usize>,
}

impl PruningReport {
    pub fn reduction_ratio(&self) -> f64 {
        if self.total_evaluated == 0 {
            return 0.0;
        }
        self.pruned_count as f64 / self.total_evaluated as f64
    }

    /// `2 ^ (pruned / total)`, the original's cosmetic search-space
    /// reduction estimate — not a new feasibility guarantee, just
    /// operator-facing telemetry over the same counters.
    pub fn estimated_speedup(&self) -> f64 {
        2f64.powf(self.reduction_ratio())
    }
}

pub struct PruningResult {
    pub allowed: Vec<(Uuid, Uuid, Uuid)>,
    pub report: PruningReport,
}

#[derive(Default)]
pub struct ConstraintPruner;

impl ConstraintPruner {
    pub fn new() -> Self {
        Self
    }

    fn check_feasibility(
        &self,
        person: &Person,
        template: &RotationTemplate,
        block: &rsched_domain::Block,
        context: &SchedulingContext,
    ) -> Option<PruningReason> {
        if !template.allowed_person_types.is_empty() && !template.allowed_person_types.contains(&person.person_type) {
            return Some(PruningReason::PersonTypeMismatch);
        }
        if let Some(pgy) = person.pgy_level() {
            if let Some(min_pgy) = template.min_pgy {
                if pgy.value() < min_pgy {
                    return Some(PruningReason::PgyLevelTooLow);
                }
            }
            if let Some(max_pgy) = template.max_pgy {
                if pgy.value() > max_pgy {
                    return Some(PruningReason::PgyLevelTooHigh);
                }
            }
        }
        if !template.required_specialties.is_empty()
            && !template
                .required_specialties
                .iter()
                .any(|s| person.specialties.contains(s))
        {
            return Some(PruningReason::SpecialtyMismatch);
        }
        if context.is_absent(person.id, block.date) {
            return Some(PruningReason::PersonUnavailable);
        }
        if let Some(fixed) = template.fixed_time_of_day {
            if fixed != block.time_of_day {
                return Some(PruningReason::TimeOfDayMismatch);
            }
        }
        None
    }

    /// Enumerates `person x block x template`, skipping cells already
    /// locked by Layer 1 pre-commits (`locked_cells`, `(person_id,
    /// block_id)` pairs), and keeps only triples that pass every
    /// feasibility check.
    pub fn prune(&self, context: &SchedulingContext, locked_cells: &HashSet<(Uuid, Uuid)>) -> PruningResult {
        let mut allowed = Vec::new();
        let mut reasons: BTreeMap<PruningReason, usize> = BTreeMap::new();
        let mut total_evaluated = 0usize;

        for person in &context.persons {
            for block in &context.blocks {
                if locked_cells.contains(&(person.id, block.id)) {
                    continue;
                }
                for template in &context.templates {
                    if template.is_archived {
                        continue;
                    }
                    total_evaluated += 1;
                    match self.check_feasibility(person, template, block, context) {
                        Some(reason) => {
                            *reasons.entry(reason).or_insert(0) += 1;
                        }
                        None => allowed.push((person.id, block.id, template.id)),
                    }
                }
            }
        }

        let pruned_count = reasons.values().sum();
        PruningResult {
            allowed,
            report: PruningReport {
                pruned_count,
                total_evaluated,
                remaining_count: total_evaluated - pruned_count,
                reasons,
            },
        }
    }

    /// Bypasses feasibility pruning entirely (`pruner.enabled = false`,
    /// spec.md §6.3): every non-archived, non-locked triple is allowed,
    /// with an all-zero report since nothing was evaluated or dropped.
    pub fn allow_all(context: &SchedulingContext, locked_cells: &HashSet<(Uuid, Uuid)>) -> PruningResult {
        let mut allowed = Vec::new();
        for person in &context.persons {
            for block in &context.blocks {
                if locked_cells.contains(&(person.id, block.id)) {
                    continue;
                }
                for template in &context.templates {
                    if template.is_archived {
                        continue;
                    }
                    allowed.push((person.id, block.id, template.id));
                }
            }
        }
        let total = allowed.len();
        PruningResult {
            allowed,
            report: PruningReport {
                pruned_count: 0,
                total_evaluated: total,
                remaining_count: total,
                reasons: BTreeMap::new(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rsched_domain::{Block, PersonType, TimeOfDay};
    use std::collections::BTreeSet;

    fn ctx_with(persons: Vec<Person>, blocks: Vec<Block>, templates: Vec<RotationTemplate>) -> SchedulingContext {
        SchedulingContext::new(
            persons,
            blocks,
            templates,
            vec![],
            vec![],
            vec![],
            vec![],
            vec![],
            vec![],
            vec![],
            NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
        )
    }

    #[test]
    fn faculty_pruned_from_resident_only_rotation() {
        let resident = Person::resident(Uuid::new_v4(), "r@b.c", 2, BTreeSet::new(), false).unwrap();
        let faculty = Person::faculty(Uuid::new_v4(), "f@b.c", BTreeSet::new(), false, None);
        let block = Block::new(Uuid::new_v4(), NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(), TimeOfDay::Am, 1);
        let mut template = RotationTemplate::new(Uuid::new_v4(), "FM Clinic", "FMC");
        template.allowed_person_types = BTreeSet::from([PersonType::Resident]);

        let ctx = ctx_with(vec![resident, faculty], vec![block], vec![template.clone()]);
        let pruner = ConstraintPruner::new();
        let result = pruner.prune(&ctx, &HashSet::new());

        assert_eq!(result.allowed.len(), 1);
        assert_eq!(
            result.report.reasons.get(&PruningReason::PersonTypeMismatch),
            Some(&1)
        );
    }

    #[test]
    fn absent_person_is_pruned() {
        let person = Person::faculty(Uuid::new_v4(), "f@b.c", BTreeSet::new(), false, None);
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let block = Block::new(Uuid::new_v4(), date, TimeOfDay::Am, 1);
        let template = RotationTemplate::new(Uuid::new_v4(), "FM Clinic", "FMC");
        let absence = rsched_domain::Absence::new(Uuid::new_v4(), person.id, date, date, rsched_domain::AbsenceType::Vacation).unwrap();

        let mut ctx = ctx_with(vec![person], vec![block], vec![template]);
        ctx = SchedulingContext::new(
            ctx.persons,
            ctx.blocks,
            ctx.templates,
            vec![],
            vec![],
            vec![],
            vec![],
            vec![absence],
            vec![],
            vec![],
            ctx.start_date,
            ctx.end_date,
        );

        let result = ConstraintPruner::new().prune(&ctx, &HashSet::new());
        assert!(result.allowed.is_empty());
        assert_eq!(
            result.report.reasons.get(&PruningReason::PersonUnavailable),
            Some(&1)
        );
    }

    #[test]
    fn locked_cells_are_skipped_entirely() {
        let person = Person::faculty(Uuid::new_v4(), "f@b.c", BTreeSet::new(), false, None);
        let block = Block::new(Uuid::new_v4(), NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(), TimeOfDay::Am, 1);
        let template = RotationTemplate::new(Uuid::new_v4(), "FM Clinic", "FMC");
        let ctx = ctx_with(vec![person.clone()], vec![block.clone()], vec![template]);

        let mut locked = HashSet::new();
        locked.insert((person.id, block.id));
        let result = ConstraintPruner::new().prune(&ctx, &locked);
        assert!(result.allowed.is_empty());
        assert_eq!(result.report.total_evaluated, 0);
    }

    #[test]
    fn estimated_speedup_matches_exponential_formula() {
        let report = PruningReport {
            pruned_count: 50,
            total_evaluated: 100,
            remaining_count: 50,
            reasons: BTreeMap::new(),
        };
        assert!((report.estimated_speedup() - 2f64.powf(0.5)).abs() < 1e-9);
    }
}
