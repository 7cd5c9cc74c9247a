//! Public facade for the residency scheduling core (spec.md §6.1).
//!
//! `SchedulingCore` wires together the pieces every other crate in this
//! workspace keeps solver-agnostic and storage-agnostic: the distributed
//! lock (`rsched-lock`) guarding one generation run per academic year at a
//! time, the solution cache (`rsched-cache`) short-circuiting a repeat run
//! over an unchanged problem, the repository (`rsched-repository`) loading
//! context and persisting results, the hybrid layer engine
//! (`rsched-engine`) doing the actual solving, and the audit chain
//! (`rsched-audit`) recording every state-changing operation.

pub mod config;
pub mod error;

pub use config::{
    AcgmeConfig, CacheConfig, LockConfig, PrunerConfig, ScoringConfig, SchedulerConfig,
    SequenceRuleConfig, SolverConfig, ValidatorConfig,
};
pub use error::{CoreError, Result};

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use rsched_audit::{action_for, apply_override as run_apply_override, append, create_genesis, verify_chain, AppendRequest, ApplyOverrideRequest, ConflictingBooking};
use rsched_cache::{generate_problem_hash, ProblemDefinition, SolutionCache};
use rsched_constraints::{
    ConstraintManager, DutyHoursConstraint, PostFmitSundayBlocking, ResidentInpatientHeadcount,
    SequenceConstraint, Validator,
};
use rsched_domain::{ActorType, Assignment, OverrideType, ScheduleOverride, SchedulingContext};
use rsched_engine::{run_generation, GenerationOutcome, GenerationRequest, RotationAssignment, SolverControl, SolverProgress};
use rsched_lock::ScheduleGenerationLock;
use rsched_repository::Repository;

/// Outcome status of a `generate_schedule` call (spec.md §6.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerateStatus {
    Ok,
    Aborted,
    Infeasible,
    Locked,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResult {
    pub run_id: Uuid,
    pub status: GenerateStatus,
    pub score: Option<f64>,
    pub violations: Vec<rsched_constraints::Violation>,
    pub assignments_count: usize,
    pub runtime_seconds: f64,
    /// Populated only when `status == locked`: seconds remaining on the
    /// lock held by the in-flight run.
    pub remaining_ttl_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbortAck {
    pub acknowledged: bool,
}

struct RunState {
    control: SolverControl,
}

/// Facade exposing the six public operations from spec.md §6.1. One
/// instance is shared (behind an `Arc`) across every caller in a process;
/// its internal state is a registry of in-flight solver runs plus the
/// sub-crate capabilities (lock/cache/repository) handed to it at
/// construction.
pub struct SchedulingCore {
    repository: Arc<dyn Repository>,
    lock: ScheduleGenerationLock,
    cache: SolutionCache,
    acgme: AcgmeConfig,
    runs: Mutex<HashMap<Uuid, RunState>>,
}

impl SchedulingCore {
    pub fn new(repository: Arc<dyn Repository>, lock: ScheduleGenerationLock, cache: SolutionCache) -> Self {
        Self {
            repository,
            lock,
            cache,
            acgme: AcgmeConfig::default(),
            runs: Mutex::new(HashMap::new()),
        }
    }

    /// Supplies the nominal-hours/headcount/sequence tables that let
    /// `build_constraint_manager` register the full ACGME hard-constraint
    /// set (spec.md §4.1.3) instead of just the config-free subset.
    /// Takes `self` by value so construction reads `core().with_acgme_config(cfg)`.
    pub fn with_acgme_config(mut self, acgme: AcgmeConfig) -> Self {
        self.acgme = acgme;
        self
    }

    /// Builds the live constraint manager for a given context: starts from
    /// `ConstraintManager::create_resilience_aware()` (the quartet and
    /// soft constraints buildable with no external data), then layers on
    /// the constraints that need `self.acgme`'s natural-key tables
    /// resolved against this context's `Uuid`s. An entry whose activity
    /// code or rotation abbreviation isn't present in this context is
    /// skipped rather than erroring — a given run's context may
    /// legitimately not cover every rotation the institution-wide config
    /// names.
    fn build_constraint_manager(&self, context: &SchedulingContext) -> ConstraintManager {
        let mut mgr = ConstraintManager::create_resilience_aware();

        if self.acgme.nominal_hours_by_activity_code.is_empty() {
            warn!("acgme.nominal_hours_by_activity_code is empty; DutyHoursConstraint not registered");
        } else {
            let nominal_hours: std::collections::BTreeMap<Uuid, f64> = context
                .activities
                .iter()
                .filter_map(|a| {
                    self.acgme
                        .nominal_hours_by_activity_code
                        .get(&a.code)
                        .map(|h| (a.id, *h))
                })
                .collect();
            if nominal_hours.is_empty() {
                warn!("no context activity matched acgme.nominal_hours_by_activity_code; DutyHoursConstraint not registered");
            } else {
                match DutyHoursConstraint::new(nominal_hours) {
                    Ok(c) => mgr.add(Box::new(c)).expect("unique name"),
                    Err(e) => warn!(%e, "failed to build DutyHoursConstraint"),
                }
            }
        }

        if !self.acgme.inpatient_headcount_by_rotation_abbreviation.is_empty() {
            let headcount: std::collections::BTreeMap<Uuid, u32> = context
                .templates
                .iter()
                .filter_map(|t| {
                    self.acgme
                        .inpatient_headcount_by_rotation_abbreviation
                        .iter()
                        .find(|(abbr, _)| abbr.eq_ignore_ascii_case(&t.abbreviation))
                        .map(|(_, n)| (t.id, *n))
                })
                .collect();
            if headcount.is_empty() {
                warn!("no context rotation template matched acgme.inpatient_headcount_by_rotation_abbreviation; ResidentInpatientHeadcount not registered");
            } else {
                mgr.add(Box::new(ResidentInpatientHeadcount::new(headcount))).expect("unique name");
            }
        }

        let protected_ids: BTreeSet<Uuid> = context
            .templates
            .iter()
            .filter(|t| {
                self.acgme
                    .protected_rotation_abbreviations
                    .iter()
                    .any(|p| p.eq_ignore_ascii_case(&t.abbreviation))
            })
            .map(|t| t.id)
            .collect();
        if !protected_ids.is_empty() {
            mgr.add(Box::new(PostFmitSundayBlocking::new(protected_ids))).expect("unique name");
        }

        for seq in &self.acgme.sequences {
            let prereq = context
                .templates
                .iter()
                .find(|t| t.abbreviation.eq_ignore_ascii_case(&seq.prereq_rotation_abbreviation));
            let followup = context
                .templates
                .iter()
                .find(|t| t.abbreviation.eq_ignore_ascii_case(&seq.followup_rotation_abbreviation));
            match (prereq, followup) {
                (Some(p), Some(f)) => {
                    let constraint = SequenceConstraint::new(seq.name.clone(), p.id, f.id, seq.max_gap_days);
                    if let Err(e) = mgr.add(Box::new(constraint)) {
                        warn!(%e, name = %seq.name, "duplicate sequence constraint name, skipped");
                    }
                }
                _ => warn!(name = %seq.name, "sequence rule references a rotation not present in this context; skipped"),
            }
        }

        mgr
    }

    /// Derives the Layer 1/2 rotation backbone from the context's existing
    /// assignments: every `(person, rotation_template)` pair present among
    /// them is treated as a standing rotation assignment spanning the
    /// earliest to latest block date it appears on. This is the
    /// simplifying rule recorded in `DESIGN.md` for how rotation
    /// assignment — absent as a first-class entity from spec.md §3 — is
    /// recovered from persisted state rather than invented as a new table.
    fn derive_rotation_assignments(context: &SchedulingContext) -> Vec<RotationAssignment> {
        let mut spans: HashMap<(Uuid, Uuid), (NaiveDate, NaiveDate)> = HashMap::new();
        for assignment in &context.existing_assignments {
            let Some(template_id) = assignment.rotation_template_id else {
                continue;
            };
            let Some(block) = context.block(assignment.block_id) else {
                continue;
            };
            spans
                .entry((assignment.person_id, template_id))
                .and_modify(|(start, end)| {
                    if block.date < *start {
                        *start = block.date;
                    }
                    if block.date > *end {
                        *end = block.date;
                    }
                })
                .or_insert((block.date, block.date));
        }
        spans
            .into_iter()
            .map(|((person_id, rotation_template_id), (start_date, end_date))| RotationAssignment {
                person_id,
                rotation_template_id,
                start_date,
                end_date,
            })
            .collect()
    }

    /// Maps each rotation template to the activity its `activity_type`
    /// names, for Layer 3's "which activity does a newly filled cell get"
    /// resolution (`DESIGN.md` Open Question).
    fn derive_primary_activity(context: &SchedulingContext) -> HashMap<Uuid, Uuid> {
        context
            .templates
            .iter()
            .filter_map(|template| {
                context
                    .activities
                    .iter()
                    .find(|activity| activity.code == template.activity_type)
                    .map(|activity| (template.id, activity.id))
            })
            .collect()
    }

    /// `generate_schedule(year_id, date_range, config)` (spec.md §6.1):
    /// acquires the per-year lock, checks the solution cache, runs the
    /// hybrid-layer engine, scores the result, persists it, and appends an
    /// audit record — in that order, mirroring the original's "context
    /// build → hybrid layer 1 protection → constraint pruning → solver →
    /// validator" pipeline (SPEC_FULL.md §2).
    pub fn generate_schedule(
        &self,
        year_id: &str,
        date_range: (NaiveDate, NaiveDate),
        config: &SchedulerConfig,
    ) -> Result<GenerateResult> {
        use rsched_foundation::Config;
        config.validate()?;

        let started = std::time::Instant::now();
        let run_id = Uuid::new_v4();

        let guard = match self
            .lock
            .acquire(year_id, Duration::from_secs(config.lock.acquisition_timeout_seconds))
        {
            Ok(guard) => guard,
            Err(rsched_lock::LockError::AcquisitionTimeout { .. }) => {
                let remaining = self
                    .lock
                    .get_lock_ttl(year_id)
                    .map(|ttl| ttl.as_secs())
                    .unwrap_or(0);
                return Ok(GenerateResult {
                    run_id,
                    status: GenerateStatus::Locked,
                    score: None,
                    violations: Vec::new(),
                    assignments_count: 0,
                    runtime_seconds: started.elapsed().as_secs_f64(),
                    remaining_ttl_seconds: Some(remaining),
                });
            }
            Err(e) => return Err(e.into()),
        };

        let context = self.repository.load_context(date_range)?;
        let rotation_assignments = Self::derive_rotation_assignments(&context);
        let primary_activity = Self::derive_primary_activity(&context);
        let constraint_manager = self.build_constraint_manager(&context);

        let person_ids: Vec<Uuid> = context.persons.iter().map(|p| p.id).collect();
        let rotation_ids: Vec<Uuid> = context.templates.iter().map(|t| t.id).collect();
        let block_ids: Vec<Uuid> = context.blocks.iter().map(|b| b.id).collect();
        let constraints_snapshot = serde_json::json!({ "constraint_count": constraint_manager.constraints().len() });
        let problem = ProblemDefinition {
            person_ids: &person_ids,
            rotation_ids: &rotation_ids,
            block_ids: &block_ids,
            constraints: &constraints_snapshot,
        };
        let problem_hash = generate_problem_hash(&problem)?;

        if let Some(cached) = self.cache.get_solution::<Vec<Assignment>>(&problem_hash)? {
            info!(year_id, %problem_hash, "reusing cached schedule solution");
            let validation = Validator::new(&constraint_manager).validate(&cached, &context);
            self.repository.write_assignments(run_id, cached.clone())?;
            self.append_generation_record(year_id, run_id, &validation, now())?;
            let status = if validation.valid { GenerateStatus::Ok } else { GenerateStatus::Infeasible };
            if !validation.valid {
                warn!(year_id, %problem_hash, "cached schedule solution carries hard-constraint violations");
            }
            return Ok(GenerateResult {
                run_id,
                status,
                score: Some(validation.score),
                violations: validation.violations,
                assignments_count: cached.len(),
                runtime_seconds: started.elapsed().as_secs_f64(),
                remaining_ttl_seconds: None,
            });
        }

        let control = SolverControl::new(Duration::from_millis(config.solver.heartbeat_ms));
        self.runs.lock().expect("run registry poisoned").insert(
            run_id,
            RunState {
                control: control.clone(),
            },
        );

        let outcome = run_generation(GenerationRequest {
            context: &context,
            rotation_assignments,
            primary_activity,
            constraint_manager: &constraint_manager,
            timeout: Duration::from_secs(config.solver.timeout_seconds),
            max_iterations: config.solver.max_iterations,
            control,
            now: now(),
            pruning_enabled: config.pruner.enabled,
        });
        self.runs.lock().expect("run registry poisoned").remove(&run_id);

        let result = match outcome {
            GenerationOutcome::Solved { assignments, .. } => {
                let validation = Validator::new(&constraint_manager).validate(&assignments, &context);
                self.repository.write_assignments(run_id, assignments.clone())?;
                self.cache.set_solution(&problem_hash, &assignments, Some(Duration::from_secs(config.cache.ttl_seconds)))?;
                self.append_generation_record(year_id, run_id, &validation, now())?;
                // The greedy backend injects only an approximate subset of
                // the Hard constraints' clauses (rolling-window checks like
                // `OneInSevenRule`/`SupervisionRatio` are evaluated here,
                // post-solve, rather than forbidden up front) — a `Solved`
                // outcome that the validator flags as Hard-violating is
                // reported as infeasible rather than silently `ok`.
                let status = if validation.valid { GenerateStatus::Ok } else { GenerateStatus::Infeasible };
                if !validation.valid {
                    warn!(year_id, %run_id, violated = validation.violations.len(), "solved schedule carries hard-constraint violations, reporting infeasible");
                }
                GenerateResult {
                    run_id,
                    status,
                    score: Some(validation.score),
                    violations: validation.violations,
                    assignments_count: assignments.len(),
                    runtime_seconds: started.elapsed().as_secs_f64(),
                    remaining_ttl_seconds: None,
                }
            }
            GenerationOutcome::AbortedWithIncumbent { assignments, .. } => {
                let validation = Validator::new(&constraint_manager).validate(&assignments, &context);
                self.repository.write_assignments(run_id, assignments.clone())?;
                GenerateResult {
                    run_id,
                    status: GenerateStatus::Aborted,
                    score: Some(validation.score),
                    violations: validation.violations,
                    assignments_count: assignments.len(),
                    runtime_seconds: started.elapsed().as_secs_f64(),
                    remaining_ttl_seconds: None,
                }
            }
            GenerationOutcome::AbortedNoIncumbent => GenerateResult {
                run_id,
                status: GenerateStatus::Aborted,
                score: None,
                violations: Vec::new(),
                assignments_count: 0,
                runtime_seconds: started.elapsed().as_secs_f64(),
                remaining_ttl_seconds: None,
            },
            GenerationOutcome::Infeasible { conflicts, .. } => {
                warn!(year_id, ?conflicts, "schedule generation infeasible");
                GenerateResult {
                    run_id,
                    status: GenerateStatus::Infeasible,
                    score: None,
                    violations: Vec::new(),
                    assignments_count: 0,
                    runtime_seconds: started.elapsed().as_secs_f64(),
                    remaining_ttl_seconds: None,
                }
            }
        };

        drop(guard);
        Ok(result)
    }

    fn append_generation_record(
        &self,
        year_id: &str,
        run_id: Uuid,
        validation: &rsched_constraints::ScoredValidation,
        timestamp: chrono::DateTime<Utc>,
    ) -> Result<()> {
        let chain_id = format!("schedule_run:{year_id}");
        let prior_chain = self.repository.read_chain(&chain_id)?;
        let payload = serde_json::json!({
            "run_id": run_id.to_string(),
            "score": validation.score,
            "violation_count": validation.violations.len(),
        });
        let record = match prior_chain.last() {
            Some(prior) => append(
                prior,
                AppendRequest {
                    action: rsched_domain::ApprovalAction::ScheduleGenerated,
                    payload,
                    actor_id: None,
                    actor_type: ActorType::System,
                    reason: None,
                    target_entity_type: Some("schedule_run".to_string()),
                    target_entity_id: Some(run_id.to_string()),
                },
                timestamp,
            )?,
            None => {
                let genesis = create_genesis(chain_id.clone(), None, None, "chain initialized", timestamp)?;
                self.repository.append_approval(genesis)?;
                append(
                    &self.repository.read_chain(&chain_id)?[0],
                    AppendRequest {
                        action: rsched_domain::ApprovalAction::ScheduleGenerated,
                        payload,
                        actor_id: None,
                        actor_type: ActorType::System,
                        reason: None,
                        target_entity_type: Some("schedule_run".to_string()),
                        target_entity_id: Some(run_id.to_string()),
                    },
                    timestamp,
                )?
            }
        };
        self.repository.append_approval(record)?;
        Ok(())
    }

    /// `validate_schedule(assignments, context)` (spec.md §6.1): a
    /// standalone, purely functional call — no lock, cache, or audit
    /// involvement.
    pub fn validate_schedule(
        &self,
        assignments: &[Assignment],
        context: &SchedulingContext,
    ) -> rsched_constraints::ScoredValidation {
        let constraint_manager = self.build_constraint_manager(context);
        Validator::new(&constraint_manager).validate(assignments, context)
    }

    /// `apply_override(assignment_id, type, replacement, reason, actor)`
    /// (spec.md §6.1 and §4.5.1): loads the assignment/activity/block and
    /// any conflicting state from the repository, runs the eligibility
    /// checks in `rsched-audit`, then persists the override and appends
    /// its audit record.
    pub fn apply_override(
        &self,
        assignment_id: Uuid,
        override_type: OverrideType,
        replacement_person_id: Option<Uuid>,
        reason: String,
        actor_id: Option<Uuid>,
        actor_type: ActorType,
    ) -> Result<ScheduleOverride> {
        let assignment = self.repository.get_assignment(assignment_id)?;
        let activity = self.repository.get_activity(assignment.effective_activity_id())?;
        let block = self.repository.get_block(assignment.block_id)?;
        let existing_active_override = self
            .repository
            .active_override_for_assignment(assignment_id)?
            .map(|o| o.id);

        let replacement_conflict = if let (OverrideType::Coverage, Some(replacement)) = (override_type, replacement_person_id) {
            self.repository
                .booking_for_person_at(replacement, block.date, block.time_of_day, assignment_id)?
                .map(|conflict| {
                    let shielded = self
                        .repository
                        .active_override_for_assignment(conflict.id)
                        .ok()
                        .flatten()
                        .map(|o| matches!(o.override_type, OverrideType::Cancellation | OverrideType::Gap))
                        .unwrap_or(false);
                    ConflictingBooking {
                        assignment_id: conflict.id,
                        shielded_by_active_override: shielded,
                    }
                })
        } else {
            None
        };

        let timestamp = now();
        let override_id = Uuid::new_v4();
        let override_record = run_apply_override(
            override_id,
            ApplyOverrideRequest {
                assignment: &assignment,
                activity: &activity,
                block: &block,
                override_type,
                replacement_person_id,
                reason,
                existing_active_override,
                replacement_conflict,
                supersedes_override_id: None,
                now: timestamp,
            },
        )?;

        self.repository.write_override(override_record.clone())?;

        let chain_id = format!("override:{assignment_id}");
        let prior_chain = self.repository.read_chain(&chain_id)?;
        let payload = serde_json::json!({
            "override_id": override_record.id.to_string(),
            "assignment_id": assignment_id.to_string(),
            "override_type": override_type,
        });
        let record = match prior_chain.last() {
            Some(prior) => append(
                prior,
                AppendRequest {
                    action: action_for(override_type),
                    payload,
                    actor_id,
                    actor_type,
                    reason: Some(override_record.reason.clone()),
                    target_entity_type: Some("assignment".to_string()),
                    target_entity_id: Some(assignment_id.to_string()),
                },
                timestamp,
            )?,
            None => {
                let genesis = create_genesis(chain_id.clone(), None, actor_id, "chain initialized", timestamp)?;
                self.repository.append_approval(genesis)?;
                append(
                    &self.repository.read_chain(&chain_id)?[0],
                    AppendRequest {
                        action: action_for(override_type),
                        payload,
                        actor_id,
                        actor_type,
                        reason: Some(override_record.reason.clone()),
                        target_entity_type: Some("assignment".to_string()),
                        target_entity_id: Some(assignment_id.to_string()),
                    },
                    timestamp,
                )?
            }
        };
        self.repository.append_approval(record)?;

        Ok(override_record)
    }

    /// `verify_approval_chain(chain_id)` (spec.md §6.1).
    pub fn verify_approval_chain(&self, chain_id: &str) -> Result<rsched_audit::ChainVerification> {
        let records = self.repository.read_chain(chain_id)?;
        Ok(verify_chain(&records)?)
    }

    /// `get_solver_progress(run_id)` (spec.md §6.1): `None` both for an
    /// unknown run and for one that has already finished, since progress
    /// is only meaningful while a solve is in flight.
    pub fn get_solver_progress(&self, run_id: Uuid) -> Option<SolverProgress> {
        self.runs
            .lock()
            .expect("run registry poisoned")
            .get(&run_id)
            .map(|state| state.control.progress())
    }

    /// `request_solver_abort(run_id, reason, actor)` (spec.md §6.1). The
    /// `reason`/`actor` parameters are accepted for signature parity with
    /// the spec and for future audit-trail use, but not currently recorded
    /// — aborting a run does not append an `ApprovalAction::Aborted`
    /// record on its own; the caller's subsequent `generate_schedule`
    /// response (`status=aborted`) is the user-visible effect.
    pub fn request_solver_abort(&self, run_id: Uuid, _reason: &str, _actor_id: Option<Uuid>) -> AbortAck {
        let acknowledged = self
            .runs
            .lock()
            .expect("run registry poisoned")
            .get(&run_id)
            .map(|state| {
                state.control.request_abort();
                true
            })
            .unwrap_or(false);
        AbortAck { acknowledged }
    }
}

fn now() -> chrono::DateTime<Utc> {
    Utc::now()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsched_cache::InMemoryCacheBackend;
    use rsched_lock::InMemoryLockBackend;
    use rsched_repository::InMemoryRepository;
    use std::collections::BTreeSet;

    fn core() -> SchedulingCore {
        SchedulingCore::new(
            Arc::new(InMemoryRepository::empty()),
            ScheduleGenerationLock::new(Arc::new(InMemoryLockBackend::new())),
            SolutionCache::new(Arc::new(InMemoryCacheBackend::new(64))),
        )
    }

    #[test]
    fn generate_schedule_on_empty_repository_is_ok_with_zero_assignments() {
        let core = core();
        let config = SchedulerConfig::default();
        let range = (
            NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
        );
        let result = core.generate_schedule("2026", range, &config).unwrap();
        assert_eq!(result.status, GenerateStatus::Ok);
        assert_eq!(result.assignments_count, 0);
    }

    #[test]
    fn verify_approval_chain_on_unknown_chain_is_trivially_ok() {
        let core = core();
        let result = core.verify_approval_chain("does-not-exist").unwrap();
        assert!(result.ok);
        assert!(result.first_bad_sequence.is_none());
    }

    #[test]
    fn get_solver_progress_for_unknown_run_is_none() {
        let core = core();
        assert!(core.get_solver_progress(Uuid::new_v4()).is_none());
    }

    #[test]
    fn request_abort_for_unknown_run_is_not_acknowledged() {
        let core = core();
        let ack = core.request_solver_abort(Uuid::new_v4(), "operator request", None);
        assert!(!ack.acknowledged);
    }

    #[test]
    fn apply_override_rejects_protected_activity_cancellation() {
        let person = rsched_domain::Person::faculty(Uuid::new_v4(), "f@b.c", BTreeSet::new(), false, None);
        let block = rsched_domain::Block::new(Uuid::new_v4(), NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(), rsched_domain::TimeOfDay::Am, 1);
        let activity = rsched_domain::Activity::new(Uuid::new_v4(), "fmit", "FMIT", rsched_domain::ActivityCategory::Clinical);
        let assignment = Assignment::new(Uuid::new_v4(), block.id, person.id, None, activity.id, rsched_domain::AssignmentRole::Primary, now());

        let repo = InMemoryRepository::new(
            vec![person.clone()],
            vec![block.clone()],
            vec![],
            vec![activity.clone()],
            vec![],
            vec![],
            vec![],
            vec![],
            vec![],
        );
        repo.write_assignments(Uuid::new_v4(), vec![assignment.clone()]).unwrap();

        let core = SchedulingCore::new(
            Arc::new(repo),
            ScheduleGenerationLock::new(Arc::new(InMemoryLockBackend::new())),
            SolutionCache::new(Arc::new(InMemoryCacheBackend::new(64))),
        );

        let result = core.apply_override(
            assignment.id,
            OverrideType::Cancellation,
            None,
            "no longer needed".to_string(),
            None,
            ActorType::Human,
        );
        assert!(matches!(result, Err(CoreError::Audit(rsched_audit::AuditError::ProtectedActivity(_)))));
    }

    /// spec.md §8.4 scenario 3: 28 consecutive days of protected inpatient
    /// half-days for one resident, with no duty-free day anywhere in the
    /// range. The greedy backend has no clause forbidding this (the
    /// `1_in_7_rule` clause is injected as a no-op), so the solver reports
    /// `Solved` — `generate_schedule` must still surface this as
    /// `status=infeasible` once the post-hoc validator flags it.
    #[test]
    fn generate_schedule_reports_infeasible_when_solved_schedule_violates_one_in_seven_rule() {
        let day0 = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let day27 = day0 + chrono::Duration::days(27);

        let person = rsched_domain::Person::resident(Uuid::new_v4(), "r1@b.c", 2, BTreeSet::new(), false).unwrap();
        let template = rsched_domain::RotationTemplate::new(Uuid::new_v4(), "inpatient", "INPT");
        let activity = rsched_domain::Activity::new(Uuid::new_v4(), "inpatient", "INPT", rsched_domain::ActivityCategory::Clinical);

        let mut blocks = Vec::new();
        let mut cursor = day0;
        while cursor <= day27 {
            blocks.push(rsched_domain::Block::new(Uuid::new_v4(), cursor, rsched_domain::TimeOfDay::Am, 1));
            blocks.push(rsched_domain::Block::new(Uuid::new_v4(), cursor, rsched_domain::TimeOfDay::Pm, 1));
            cursor = cursor.succ_opt().unwrap();
        }

        let mut patterns = Vec::new();
        for day_of_week in 0..7u8 {
            for time in [rsched_domain::TimeOfDay::Am, rsched_domain::TimeOfDay::Pm] {
                patterns.push(
                    rsched_domain::WeeklyPattern::new(Uuid::new_v4(), template.id, day_of_week, time, activity.id)
                        .protected(),
                );
            }
        }

        let existing = vec![
            Assignment::new(Uuid::new_v4(), blocks[0].id, person.id, Some(template.id), activity.id, rsched_domain::AssignmentRole::Primary, now()),
            Assignment::new(Uuid::new_v4(), blocks[blocks.len() - 1].id, person.id, Some(template.id), activity.id, rsched_domain::AssignmentRole::Primary, now()),
        ];

        let repo = InMemoryRepository::new(
            vec![person.clone()],
            blocks,
            vec![template],
            vec![activity],
            patterns,
            vec![],
            vec![],
            vec![],
            vec![],
        );
        repo.write_assignments(Uuid::new_v4(), existing).unwrap();

        let core = SchedulingCore::new(
            Arc::new(repo),
            ScheduleGenerationLock::new(Arc::new(InMemoryLockBackend::new())),
            SolutionCache::new(Arc::new(InMemoryCacheBackend::new(64))),
        );

        let config = SchedulerConfig::default();
        let result = core.generate_schedule("2026", (day0, day27), &config).unwrap();
        assert_eq!(result.status, GenerateStatus::Infeasible, "violations: {:?}", result.violations);
        assert!(result.violations.iter().any(|v| v.constraint_name == "1_in_7_rule"));
    }
}
