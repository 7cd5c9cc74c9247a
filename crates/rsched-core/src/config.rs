//! `SchedulerConfig`: the recognized configuration surface (spec.md §6.3),
//! implemented against `rsched_foundation::Config` the way the teacher's
//! concrete configs implement it.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use rsched_foundation::{Config, FoundationError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub timeout_seconds: u64,
    pub max_iterations: u64,
    pub heartbeat_ms: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 60,
            max_iterations: 1000,
            heartbeat_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    pub ttl_seconds: u64,
    pub acquisition_timeout_seconds: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 600,
            acquisition_timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_seconds: 3600 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrunerConfig {
    pub enabled: bool,
}

impl Default for PrunerConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    pub critical_fail_score_cap: f64,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            critical_fail_score_cap: 0.0,
        }
    }
}

/// `{acgme_compliance, coverage_rate, resilience, load_balance,
/// preference_alignment}`, required to sum to `1.0 ± 0.001`. The scoring
/// formula itself lives in `rsched_constraints::Validator`, which
/// currently applies its own fixed weights (spec.md §4.4) rather than
/// reading this map — see `DESIGN.md` for the open item to wire it
/// through.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: BTreeMap<String, f64>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        let mut weights = BTreeMap::new();
        weights.insert("acgme_compliance".to_string(), 0.30);
        weights.insert("coverage_rate".to_string(), 0.25);
        weights.insert("resilience".to_string(), 0.15);
        weights.insert("load_balance".to_string(), 0.15);
        weights.insert("preference_alignment".to_string(), 0.15);
        Self { weights }
    }
}

/// A single `SequenceConstraint` (spec.md §4.1.2) expressed in terms of
/// rotation-template abbreviations rather than runtime `Uuid`s, since the
/// template identifiers themselves only exist once a context is loaded
/// from the repository. `SchedulingCore::build_constraint_manager`
/// resolves each entry against a loaded context's templates; an entry
/// naming a rotation that doesn't exist in that context is skipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceRuleConfig {
    pub name: String,
    pub prereq_rotation_abbreviation: String,
    pub followup_rotation_abbreviation: String,
    pub max_gap_days: i64,
}

/// Configuration-driven wiring for the ACGME hard constraints that need
/// data beyond what a bare `Default` can supply (spec.md §4.1.2,
/// §9 Open Questions): nominal duty hours per activity, required
/// inpatient headcount per rotation, which rotations count as
/// "protected" for the post-FMIT Sunday block, and any prerequisite/
/// follow-up rotation sequences. Entries are keyed by the domain's
/// natural identifiers (activity `code`, rotation `abbreviation`) so
/// this can be supplied once, ahead of knowing any particular context's
/// generated `Uuid`s.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AcgmeConfig {
    /// Nominal hours a half-day of a given activity code counts toward
    /// the 80-hour rule. Empty by default — per spec.md §9's Open
    /// Question, this table has no canonical source and must be
    /// supplied by the operator; `DutyHoursConstraint` is left
    /// unregistered (and a warning logged) until it is.
    pub nominal_hours_by_activity_code: BTreeMap<String, f64>,
    /// Required inpatient headcount per rotation abbreviation
    /// (Block 10 policy, spec.md §4.1.2 `ResidentInpatientHeadcount`).
    pub inpatient_headcount_by_rotation_abbreviation: BTreeMap<String, u32>,
    /// Rotation abbreviations (matched case-insensitively) that trigger
    /// `PostFmitSundayBlocking` when a resident ends one on a Saturday.
    pub protected_rotation_abbreviations: BTreeSet<String>,
    /// Prerequisite -> follow-up rotation sequences to enforce.
    pub sequences: Vec<SequenceRuleConfig>,
}

impl Default for AcgmeConfig {
    fn default() -> Self {
        Self {
            nominal_hours_by_activity_code: BTreeMap::new(),
            inpatient_headcount_by_rotation_abbreviation: BTreeMap::new(),
            protected_rotation_abbreviations: BTreeSet::from(["FMIT".to_string()]),
            sequences: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SchedulerConfig {
    pub solver: SolverConfig,
    pub lock: LockConfig,
    pub cache: CacheConfig,
    pub pruner: PrunerConfig,
    pub validator: ValidatorConfig,
    pub scoring: ScoringConfig,
    pub acgme: AcgmeConfig,
}

impl Config for SchedulerConfig {
    fn validate(&self) -> Result<()> {
        if self.solver.timeout_seconds == 0 {
            return Err(FoundationError::Validation(
                "solver.timeout_seconds must be greater than zero".to_string(),
            ));
        }
        let sum: f64 = self.scoring.weights.values().sum();
        if (sum - 1.0).abs() > 0.001 {
            return Err(FoundationError::Validation(format!(
                "scoring.weights must sum to 1.0 (+/- 0.001), got {sum}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = SchedulerConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut config = SchedulerConfig::default();
        config.solver.timeout_seconds = 0;
        assert!(matches!(config.validate(), Err(FoundationError::Validation(_))));
    }

    #[test]
    fn misweighted_scoring_is_rejected() {
        let mut config = SchedulerConfig::default();
        config.scoring.weights.insert("acgme_compliance".to_string(), 0.9);
        assert!(matches!(config.validate(), Err(FoundationError::Validation(_))));
    }
}
