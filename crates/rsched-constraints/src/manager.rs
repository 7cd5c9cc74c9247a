//! `ConstraintManager`: composes and runs a constraint set.
//! `ConstraintValidator`: meta-validates the set itself.

use std::collections::BTreeMap;

use rsched_domain::{Assignment, SchedulingContext};

use crate::constraint::{Constraint, ConstraintType};
use crate::error::{ConstraintError, Result};
use crate::model::{DecisionVars, ModelSink};
use crate::rules::{
    AvailabilityConstraint, HubProtectionConstraint, OneInSevenRule, OnePersonPerBlock,
    ResilienceConstraint, SundayCallEquityConstraint, SupervisionRatio,
    TuesdayCallPreferenceConstraint, UtilizationBufferConstraint, WeekdayCallEquityConstraint,
};
use crate::severity::Severity;
use crate::validator::ValidationReport;
use crate::violation::Violation;

/// Composes a list of constraints and runs them together.
pub struct ConstraintManager {
    constraints: Vec<Box<dyn Constraint>>,
}

impl ConstraintManager {
    pub fn new() -> Self {
        Self {
            constraints: Vec::new(),
        }
    }

    /// Add a constraint, rejecting a duplicate name.
    pub fn add(&mut self, constraint: Box<dyn Constraint>) -> Result<()> {
        if self.constraints.iter().any(|c| c.name() == constraint.name()) {
            return Err(ConstraintError::DuplicateName(constraint.name().to_string()));
        }
        self.constraints.push(constraint);
        Ok(())
    }

    /// The ACGME quartet (`AvailabilityConstraint`, `OneInSevenRule`,
    /// `SupervisionRatio`, plus `OnePersonPerBlock`) wherever it can be
    /// built with no external configuration, plus the call-equity soft
    /// constraints. `DutyHoursConstraint` needs a nominal-hours-per-activity
    /// table, and `ResidentInpatientHeadcount`/`PostFmitSundayBlocking`/
    /// `SequenceConstraint` need rotation-template identifiers resolved
    /// from a loaded context, so callers register those themselves once
    /// that data is available (`SchedulingCore::build_constraint_manager`
    /// does this for the production facade).
    pub fn create_default() -> Self {
        let mut mgr = Self::new();
        mgr.add(Box::new(AvailabilityConstraint::default())).expect("unique name");
        mgr.add(Box::new(OnePersonPerBlock::default())).expect("unique name");
        mgr.add(Box::new(OneInSevenRule::default())).expect("unique name");
        mgr.add(Box::new(SupervisionRatio::default())).expect("unique name");
        mgr.add(Box::new(SundayCallEquityConstraint::default())).expect("unique name");
        mgr.add(Box::new(WeekdayCallEquityConstraint::default())).expect("unique name");
        mgr.add(Box::new(TuesdayCallPreferenceConstraint::default())).expect("unique name");
        mgr
    }

    /// `create_default()` plus the resilience-family soft constraints.
    /// Resilience constraints degrade to no-ops when the context carries
    /// no resilience data (`SchedulingContext::has_resilience_data`), so
    /// adding them is always safe.
    pub fn create_resilience_aware() -> Self {
        let mut mgr = Self::create_default();
        mgr.add(Box::new(HubProtectionConstraint::default())).expect("unique name");
        mgr.add(Box::new(UtilizationBufferConstraint::default())).expect("unique name");
        mgr.add(Box::new(ResilienceConstraint::default())).expect("unique name");
        mgr
    }

    pub fn constraints(&self) -> &[Box<dyn Constraint>] {
        &self.constraints
    }

    pub fn inject_all(&self, sink: &mut dyn ModelSink, vars: &dyn DecisionVars, context: &SchedulingContext) {
        let mut ordered: Vec<&Box<dyn Constraint>> = self.constraints.iter().filter(|c| c.enabled()).collect();
        ordered.sort_by(|a, b| b.priority().cmp(&a.priority()));
        for constraint in ordered {
            constraint.inject(sink, vars, context);
        }
    }

    pub fn validate_all(&self, assignments: &[Assignment], context: &SchedulingContext) -> ValidationReport {
        let mut by_severity: BTreeMap<Severity, Vec<Violation>> = BTreeMap::new();
        let mut total_penalty = 0.0;
        let mut any_hard_violated = false;

        for constraint in self.constraints.iter().filter(|c| c.enabled()) {
            let result = constraint.validate(assignments, context);
            if constraint.is_hard() && !result.satisfied {
                any_hard_violated = true;
            }
            if result.penalty.is_finite() {
                total_penalty += result.penalty;
            }
            for v in result.violations {
                by_severity.entry(v.severity).or_default().push(v);
            }
        }

        ValidationReport {
            valid: !any_hard_violated,
            total_penalty,
            violations_by_severity: by_severity,
        }
    }
}

impl Default for ConstraintManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Meta-validation over a constraint set: syntax, coverage, and
/// feasibility heuristics.
pub struct ConstraintValidator;

#[derive(Debug, Clone)]
pub struct MetaValidationReport {
    pub valid: bool,
    pub issues: Vec<String>,
}

/// `constraint_type`s that any production manager must carry at least
/// one hard constraint for, per spec.md §4.1.3's "ACGME quartet".
const ACGME_QUARTET: [ConstraintType; 4] = [
    ConstraintType::Availability,
    ConstraintType::DutyHours,
    ConstraintType::ConsecutiveDays,
    ConstraintType::Supervision,
];

impl ConstraintValidator {
    pub fn validate(manager: &ConstraintManager) -> MetaValidationReport {
        let mut issues = Vec::new();

        for c in manager.constraints() {
            if c.name().trim().is_empty() {
                issues.push("constraint has empty name".to_string());
            }
        }
        let mut names: Vec<&str> = manager.constraints().iter().map(|c| c.name()).collect();
        names.sort_unstable();
        if names.windows(2).any(|w| w[0] == w[1]) {
            issues.push("duplicate constraint names present".to_string());
        }

        for required in ACGME_QUARTET {
            let present = manager
                .constraints()
                .iter()
                .any(|c| c.is_hard() && c.constraint_type() == required);
            if !present {
                issues.push(format!("ACGME quartet missing coverage for {required:?}"));
            }
        }

        let hard_count = manager.constraints().iter().filter(|c| c.is_hard()).count();
        if hard_count > 20 {
            issues.push(format!(
                "{hard_count} hard constraints active; likely infeasibility risk above 20"
            ));
        }

        MetaValidationReport {
            valid: issues.is_empty(),
            issues,
        }
    }
}
