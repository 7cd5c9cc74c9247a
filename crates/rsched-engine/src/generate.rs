//! Wires the pruner, variable pool, hybrid layers, constraint injection,
//! and solver backend into one generation pass (spec.md §2 data flow:
//! "context build → hybrid layer 1 protection → constraint pruning →
//! solver → validator").
//!
//! `rsched-core` wraps `run_generation` with the lock acquisition,
//! solution cache lookup, and audit-chain append that surround it in the
//! public `generate_schedule` operation.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use rsched_constraints::{ConstraintManager, DecisionVars};
use rsched_domain::{Assignment, AssignmentRole, SchedulingContext};

use crate::hybrid::{
    apply_protected_patterns, build_structural_requirements, inject_structural_requirements,
    locked_cell_keys, locked_cells_as_assignments, RotationAssignment,
};
use crate::pruner::ConstraintPruner;
use crate::solver::{GreedySolverBackend, SolveOutcome, SolverControl};
use crate::variables::VariablePool;

/// One generation run's inputs. `primary_activity` maps a rotation
/// template to the activity its free-fill cells resolve to; this is the
/// simplifying rule recorded in `DESIGN.md` for how Layer 3 resolves
/// "which activity" for a cell the solver turns on.
pub struct GenerationRequest<'a> {
    pub context: &'a SchedulingContext,
    pub rotation_assignments: Vec<RotationAssignment>,
    pub primary_activity: HashMap<Uuid, Uuid>,
    pub constraint_manager: &'a ConstraintManager,
    pub timeout: Duration,
    pub max_iterations: u64,
    pub control: SolverControl,
    pub now: DateTime<Utc>,
    /// Whether to run the pruner (spec.md §6.3 `pruner.enabled`). When
    /// `false`, every `(person, block, rotation)` triple not already
    /// Layer-1-locked is allocated a decision variable, relying entirely
    /// on the solver's hard constraints for feasibility.
    pub pruning_enabled: bool,
}

#[derive(Debug)]
pub enum GenerationOutcome {
    Solved {
        assignments: Vec<Assignment>,
        objective: f64,
        pruning_report: crate::pruner::PruningReport,
    },
    Infeasible {
        conflicts: Vec<String>,
        pruning_report: crate::pruner::PruningReport,
    },
    AbortedNoIncumbent,
    AbortedWithIncumbent {
        assignments: Vec<Assignment>,
        objective: f64,
    },
}

/// Runs Layer 1 → pruning → variable allocation → Layer 2 → constraint
/// injection → solve → Assignment extraction, in that order.
pub fn run_generation(req: GenerationRequest<'_>) -> GenerationOutcome {
    let locked = apply_protected_patterns(req.context, &req.rotation_assignments);
    // A cell is off-limits to the free-fill layer either because Layer 1
    // pre-committed it or because the repository already persisted an
    // assignment for that (person, block) — e.g. from a prior run over
    // the same date range. Neither is a decision the solver gets to make
    // again.
    let mut locked_keys = locked_cell_keys(&locked);
    locked_keys.extend(
        req.context
            .existing_assignments
            .iter()
            .map(|a| (a.person_id, a.block_id)),
    );
    let mut next_id = {
        let mut counter = 0u64;
        move || {
            counter += 1;
            Uuid::new_v5(&Uuid::NAMESPACE_OID, format!("run-assignment-{counter}").as_bytes())
        }
    };
    let mut assignments = locked_cells_as_assignments(&locked, req.now, &mut next_id);

    if req.context.persons.is_empty() || req.context.blocks.is_empty() {
        return GenerationOutcome::Solved {
            assignments,
            objective: 0.0,
            pruning_report: crate::pruner::PruningReport {
                pruned_count: 0,
                total_evaluated: 0,
                remaining_count: 0,
                reasons: Default::default(),
            },
        };
    }

    let pruning = if req.pruning_enabled {
        ConstraintPruner::new().prune(req.context, &locked_keys)
    } else {
        crate::pruner::ConstraintPruner::allow_all(req.context, &locked_keys)
    };
    let triples = pruning.allowed.clone();

    if triples.is_empty() {
        return GenerationOutcome::Solved {
            assignments,
            objective: 0.0,
            pruning_report: pruning.report,
        };
    }

    let mut backend = GreedySolverBackend::new(triples.len());
    let mut next_var = 0usize;
    let pool = VariablePool::build(&triples, || {
        let v = next_var;
        next_var += 1;
        v
    });

    // Per-(person, block) occupancy: a given person occupies at most one
    // free slot (i.e. picks at most one rotation template) for a given
    // block (spec.md §4.3). This must stay scoped to one person — grouping
    // by block alone would wrongly cap an entire half-day to a single
    // person across every resident and faculty member on it.
    for group in pool.person_block_groups() {
        if group.len() > 1 {
            use rsched_constraints::{Clause, ModelSink};
            backend.add_clause(Clause::AtMostOne(group.clone()), "one_template_per_person_per_block");
        }
    }

    req.constraint_manager.inject_all(&mut backend, &pool, req.context);

    let free_slot_counts = |person: Uuid, template: Uuid, _activity: Uuid| {
        pool.vars_for_person_template(person, template).len() as u32
    };
    let structural = build_structural_requirements(
        req.context,
        &req.rotation_assignments,
        &locked,
        free_slot_counts,
    );
    inject_structural_requirements(&mut backend, &structural, |person, template| {
        pool.vars_for_person_template(person, template)
    });

    let outcome = backend.solve(req.timeout, req.max_iterations, &req.control);

    match outcome {
        SolveOutcome::Solved { assignment, objective } => {
            extend_with_solved_vars(&mut assignments, &assignment, &pool, &req.primary_activity, req.now, &mut next_id);
            GenerationOutcome::Solved {
                assignments,
                objective,
                pruning_report: pruning.report,
            }
        }
        SolveOutcome::Infeasible { conflicts } => GenerationOutcome::Infeasible {
            conflicts,
            pruning_report: pruning.report,
        },
        SolveOutcome::AbortedNoIncumbent => {
            if assignments.is_empty() {
                GenerationOutcome::AbortedNoIncumbent
            } else {
                GenerationOutcome::AbortedWithIncumbent {
                    assignments,
                    objective: 0.0,
                }
            }
        }
        SolveOutcome::AbortedWithIncumbent { assignment, objective } => {
            extend_with_solved_vars(&mut assignments, &assignment, &pool, &req.primary_activity, req.now, &mut next_id);
            GenerationOutcome::AbortedWithIncumbent { assignments, objective }
        }
    }
}

fn extend_with_solved_vars(
    assignments: &mut Vec<Assignment>,
    solved: &HashMap<usize, bool>,
    pool: &VariablePool,
    primary_activity: &HashMap<Uuid, Uuid>,
    now: DateTime<Utc>,
    next_id: &mut impl FnMut() -> Uuid,
) {
    for var in pool.all_vars() {
        if !solved.get(&var).copied().unwrap_or(false) {
            continue;
        }
        let Some((person, block, template)) = pool.triple_for(var) else {
            continue;
        };
        let Some(&activity_id) = primary_activity.get(&template) else {
            continue;
        };
        assignments.push(Assignment::new(
            next_id(),
            block,
            person,
            Some(template),
            activity_id,
            AssignmentRole::Primary,
            now,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rsched_domain::{Block, Person, RotationTemplate, TimeOfDay};
    use std::collections::BTreeSet;

    #[test]
    fn empty_context_generates_zero_assignments() {
        let context = SchedulingContext::new(
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
        );
        let manager = ConstraintManager::create_default();
        let req = GenerationRequest {
            context: &context,
            rotation_assignments: vec![],
            primary_activity: HashMap::new(),
            constraint_manager: &manager,
            timeout: Duration::from_secs(5),
            max_iterations: 100,
            control: SolverControl::default(),
            now: Utc::now(),
            pruning_enabled: true,
        };
        match run_generation(req) {
            GenerationOutcome::Solved { assignments, .. } => assert!(assignments.is_empty()),
            other => panic!("expected Solved, got {other:?}"),
        }
    }

    #[test]
    fn small_context_fills_free_cells() {
        let person = Person::faculty(Uuid::new_v4(), "f@b.c", BTreeSet::new(), false, None);
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let block = Block::new(Uuid::new_v4(), date, TimeOfDay::Am, 1);
        let template = RotationTemplate::new(Uuid::new_v4(), "FM Clinic", "FMC");
        let activity_id = Uuid::new_v4();

        let context = SchedulingContext::new(
            vec![person.clone()],
            vec![block.clone()],
            vec![template.clone()],
            vec![],
            vec![],
            vec![],
            vec![],
            vec![],
            vec![],
            vec![],
            date,
            date,
        );

        let mut primary_activity = HashMap::new();
        primary_activity.insert(template.id, activity_id);

        let manager = ConstraintManager::create_default();
        let req = GenerationRequest {
            context: &context,
            rotation_assignments: vec![RotationAssignment {
                person_id: person.id,
                rotation_template_id: template.id,
                start_date: date,
                end_date: date,
            }],
            primary_activity,
            constraint_manager: &manager,
            timeout: Duration::from_secs(5),
            max_iterations: 100,
            control: SolverControl::default(),
            now: Utc::now(),
            pruning_enabled: true,
        };

        match run_generation(req) {
            GenerationOutcome::Solved { assignments, .. } => {
                assert_eq!(assignments.len(), 1);
                assert_eq!(assignments[0].person_id, person.id);
                assert_eq!(assignments[0].activity_id, activity_id);
            }
            other => panic!("expected Solved, got {other:?}"),
        }
    }
}
