//! The standalone validation engine and its scoring formula (spec.md §4.4).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use rsched_domain::{Assignment, SchedulingContext};

use crate::manager::ConstraintManager;
use crate::severity::Severity;
use crate::violation::Violation;

/// Aggregated result of `validate_all`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub total_penalty: f64,
    pub violations_by_severity: BTreeMap<Severity, Vec<Violation>>,
}

impl ValidationReport {
    pub fn violation_count(&self) -> usize {
        self.violations_by_severity.values().map(Vec::len).sum()
    }

    pub fn all_violations(&self) -> impl Iterator<Item = &Violation> {
        self.violations_by_severity.values().flatten()
    }
}

/// The five closed scoring components, weights summing to 1.0
/// (spec.md §4.4).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoreComponents {
    pub acgme_compliance: f64,
    pub coverage_rate: f64,
    pub resilience: f64,
    pub load_balance: f64,
    pub preference_alignment: f64,
}

const WEIGHT_ACGME: f64 = 0.30;
const WEIGHT_COVERAGE: f64 = 0.25;
const WEIGHT_RESILIENCE: f64 = 0.15;
const WEIGHT_LOAD_BALANCE: f64 = 0.15;
const WEIGHT_PREFERENCE: f64 = 0.15;

/// Overall validation score and contributing component breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredValidation {
    pub valid: bool,
    pub score: f64,
    pub components: ScoreComponents,
    pub violations: Vec<Violation>,
}

/// A standalone, purely functional engine: given a concrete assignment
/// set and a context, scores it deterministically.
pub struct Validator<'a> {
    manager: &'a ConstraintManager,
}

impl<'a> Validator<'a> {
    pub fn new(manager: &'a ConstraintManager) -> Self {
        Self { manager }
    }

    pub fn validate(&self, assignments: &[Assignment], context: &SchedulingContext) -> ScoredValidation {
        let report = self.manager.validate_all(assignments, context);
        let any_critical = report
            .all_violations()
            .any(|v| v.severity == Severity::Critical);

        let components = self.score_components(assignments, context, &report);
        let mut score = WEIGHT_ACGME * components.acgme_compliance
            + WEIGHT_COVERAGE * components.coverage_rate
            + WEIGHT_RESILIENCE * components.resilience
            + WEIGHT_LOAD_BALANCE * components.load_balance
            + WEIGHT_PREFERENCE * components.preference_alignment;
        score = score.clamp(0.0, 1.0);

        let valid = report.valid && !any_critical;
        // A critical violation forces valid=false regardless of score,
        // but the score itself is left intact for diagnostics.
        ScoredValidation {
            valid,
            score,
            components,
            violations: report.all_violations().cloned().collect(),
        }
    }

    fn score_components(
        &self,
        assignments: &[Assignment],
        context: &SchedulingContext,
        report: &ValidationReport,
    ) -> ScoreComponents {
        let acgme_violation_count = report
            .all_violations()
            .filter(|v| {
                matches!(
                    v.constraint_type,
                    crate::constraint::ConstraintType::DutyHours
                        | crate::constraint::ConstraintType::ConsecutiveDays
                        | crate::constraint::ConstraintType::Supervision
                        | crate::constraint::ConstraintType::Availability
                )
            })
            .count();
        let acgme_compliance = if acgme_violation_count == 0 { 1.0 } else { 0.0 };

        let total_cells = context.blocks.len().max(1);
        let filled_cells: std::collections::HashSet<_> =
            assignments.iter().map(|a| a.block_id).collect();
        let coverage_rate = filled_cells.len() as f64 / total_cells as f64;

        let resilience = if context.resilience.has_data() {
            (1.0 - context.resilience.current_utilization / context.resilience.target_utilization.max(0.01))
                .clamp(0.0, 1.0)
        } else {
            1.0
        };

        let mut per_person_counts: std::collections::HashMap<uuid::Uuid, f64> =
            std::collections::HashMap::new();
        for a in assignments {
            *per_person_counts.entry(a.person_id).or_insert(0.0) += 1.0;
        }
        let values: Vec<f64> = per_person_counts.values().copied().collect();
        let load_balance = if values.is_empty() {
            1.0
        } else {
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
            (1.0 / (1.0 + var)).clamp(0.0, 1.0)
        };

        let soft_penalty: f64 = report
            .all_violations()
            .filter(|v| v.penalty.is_finite())
            .map(|v| v.penalty)
            .sum();
        let preference_alignment = (1.0 / (1.0 + soft_penalty / 100.0)).clamp(0.0, 1.0);

        ScoreComponents {
            acgme_compliance,
            coverage_rate,
            resilience,
            load_balance,
            preference_alignment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rsched_domain::{Block, Person, TimeOfDay};
    use uuid::Uuid;

    fn empty_context() -> SchedulingContext {
        SchedulingContext::new(
            vec![],
            vec![],
            vec![],
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
    fn empty_assignment_set_scores_without_acgme_violations() {
        let manager = ConstraintManager::create_default();
        let context = empty_context();
        let validator = Validator::new(&manager);
        let result = validator.validate(&[], &context);
        assert!(result.valid);
        assert_eq!(result.components.acgme_compliance, 1.0);
    }

    #[test]
    fn absent_person_assignment_is_invalid() {
        let mut manager = ConstraintManager::new();
        manager
            .add(Box::new(crate::rules::AvailabilityConstraint::default()))
            .unwrap();

        let person_id = Uuid::new_v4();
        let block_id = Uuid::new_v4();
        let date = NaiveDate::from_ymd_opt(2026, 2, 2).unwrap();
        let person = Person::faculty(person_id, "a@b.c", Default::default(), false, None);
        let block = Block::new(block_id, date, TimeOfDay::Am, 1);
        let absence = rsched_domain::Absence::new(
            Uuid::new_v4(),
            person_id,
            date,
            date,
            rsched_domain::AbsenceType::Vacation,
        )
        .unwrap();
        let context = SchedulingContext::new(
            vec![person],
            vec![block],
            vec![],
            vec![],
            vec![],
            vec![],
            vec![],
            vec![absence],
            vec![],
            vec![],
            date,
            date,
        );
        let assignment = Assignment::new(
            Uuid::new_v4(),
            block_id,
            person_id,
            None,
            Uuid::new_v4(),
            rsched_domain::AssignmentRole::Primary,
            chrono::Utc::now(),
        );
        let validator = Validator::new(&manager);
        let result = validator.validate(&[assignment], &context);
        assert!(!result.valid);
    }
}
