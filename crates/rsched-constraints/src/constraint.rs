//! The `Constraint` trait and the closed sets of types it is tagged with.

use serde::{Deserialize, Serialize};

use rsched_domain::{Assignment, SchedulingContext};

use crate::model::{DecisionVars, ModelSink};
use crate::violation::Violation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintType {
    Availability,
    DutyHours,
    ConsecutiveDays,
    Supervision,
    Capacity,
    Rotation,
    Preference,
    Equity,
    Continuity,
    Call,
    Specialty,
    Resilience,
    HubProtection,
    UtilizationBuffer,
}

/// Priority band. The numeric value feeds directly into the soft-penalty
/// formula `weight * violation_count * priority.value()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl ConstraintPriority {
    pub fn value(&self) -> u32 {
        match self {
            ConstraintPriority::Critical => 100,
            ConstraintPriority::High => 75,
            ConstraintPriority::Medium => 50,
            ConstraintPriority::Low => 25,
        }
    }
}

/// Human-readable summary of a constraint, for logging and audit payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Description {
    pub name: String,
    pub constraint_type: ConstraintType,
    pub priority: ConstraintPriority,
    pub is_hard: bool,
    pub weight: Option<f64>,
    pub summary: String,
}

/// The outcome of validating one constraint against a concrete assignment
/// set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstraintResult {
    pub satisfied: bool,
    pub violations: Vec<Violation>,
    pub penalty: f64,
}

impl ConstraintResult {
    pub fn ok() -> Self {
        Self {
            satisfied: true,
            violations: Vec::new(),
            penalty: 0.0,
        }
    }

    pub fn hard_violation(violations: Vec<Violation>) -> Self {
        Self {
            satisfied: false,
            violations,
            penalty: f64::INFINITY,
        }
    }

    pub fn soft_violation(violations: Vec<Violation>, penalty: f64) -> Self {
        Self {
            satisfied: violations.is_empty(),
            violations,
            penalty,
        }
    }
}

/// A constraint is a polymorphic object with the capability set
/// `{inject, validate, describe}`. Hard constraints return `f64::INFINITY`
/// as their penalty on any violation; soft constraints scale their
/// penalty by `weight * priority`.
pub trait Constraint: Send + Sync {
    fn name(&self) -> &str;
    fn constraint_type(&self) -> ConstraintType;
    fn priority(&self) -> ConstraintPriority;
    fn is_hard(&self) -> bool;

    /// `1.0` for hard constraints, since their penalty is already
    /// infinite; meaningful only for soft constraints.
    fn weight(&self) -> f64 {
        1.0
    }

    fn enabled(&self) -> bool {
        true
    }

    /// Produce solver-side clauses over the decision variables.
    fn inject(&self, sink: &mut dyn ModelSink, vars: &dyn DecisionVars, context: &SchedulingContext);

    /// Verify the constraint against a concrete set of assignments.
    fn validate(&self, assignments: &[Assignment], context: &SchedulingContext) -> ConstraintResult;

    fn describe(&self) -> Description {
        Description {
            name: self.name().to_string(),
            constraint_type: self.constraint_type(),
            priority: self.priority(),
            is_hard: self.is_hard(),
            weight: (!self.is_hard()).then(|| self.weight()),
            summary: format!(
                "{} ({:?}, {})",
                self.name(),
                self.constraint_type(),
                if self.is_hard() { "hard" } else { "soft" }
            ),
        }
    }
}
