//! Hybrid Layer Engine (spec.md §4.2): L1 protected patterns pre-commit,
//! L2 activity requirements become structural count bounds, L3 is free
//! fill over whatever remains. Composition is additive — L1 shrinks the
//! free decision set, L2 injects count constraints into L3, and no layer
//! can override a stricter one.

use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};
use uuid::Uuid;

use rsched_constraints::{Clause, ModelSink};
use rsched_domain::{Assignment, AssignmentRole, SchedulingContext};

/// A Layer 1 pre-commit: the solver never sees this cell as a decision
/// variable. `week_number` is 1-4 within the rotation assignment, used by
/// Layer 2 to subtract covered half-days from a requirement's remaining
/// count.
#[derive(Debug, Clone)]
pub struct LockedCell {
    pub person_id: Uuid,
    pub block_id: Uuid,
    pub rotation_template_id: Uuid,
    pub activity_id: Uuid,
    pub week_number: u8,
}

/// One (person, rotation) -> activity code assignment the caller supplies
/// to Layer 1: which rotation a person is on, and over which date range,
/// so protected `WeeklyPattern` rows can be expanded into concrete
/// `LockedCell`s.
#[derive(Debug, Clone)]
pub struct RotationAssignment {
    pub person_id: Uuid,
    pub rotation_template_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Layer 1: expands protected `WeeklyPattern` rows across every
/// `RotationAssignment`'s date range into concrete locked cells, one per
/// matching `(day_of_week, time_of_day)` block found in the context.
pub fn apply_protected_patterns(
    context: &SchedulingContext,
    rotation_assignments: &[RotationAssignment],
) -> Vec<LockedCell> {
    let mut locked = Vec::new();

    for ra in rotation_assignments {
        let protected_patterns: Vec<_> = context
            .patterns
            .iter()
            .filter(|p| p.rotation_template_id == ra.rotation_template_id && p.is_protected)
            .collect();
        if protected_patterns.is_empty() {
            continue;
        }

        let mut week_number = 1u8;
        let mut cursor = ra.start_date;
        let mut week_start = ra.start_date;
        while cursor <= ra.end_date {
            if (cursor - week_start).num_days() >= 7 {
                week_start = cursor;
                week_number = (week_number % 4) + 1;
            }
            for block in context.blocks_on(cursor) {
                if let Some(pattern) = protected_patterns
                    .iter()
                    .find(|p| p.day_of_week == cursor.weekday().num_days_from_monday() as u8 && p.time_of_day == block.time_of_day)
                {
                    locked.push(LockedCell {
                        person_id: ra.person_id,
                        block_id: block.id,
                        rotation_template_id: ra.rotation_template_id,
                        activity_id: pattern.activity_id,
                        week_number,
                    });
                }
            }
            cursor = cursor.succ_opt().expect("date overflow");
        }
    }

    locked
}

/// A structural bound derived from Layer 2: the count of assignments to
/// `activity_id` within `scope_vars` must lie in `[min, max]`, with a
/// soft pull toward `target` weighted by `priority`.
#[derive(Debug, Clone)]
pub struct StructuralRequirement {
    pub rotation_template_id: Uuid,
    pub activity_id: Uuid,
    pub person_id: Uuid,
    pub min_remaining: u32,
    pub max_remaining: u32,
    pub target_remaining: u32,
    pub priority: u8,
    /// `false` when the requirement cannot possibly be met with the
    /// remaining free slots (min_remaining exceeds the count of
    /// candidate vars) — reported, not silently dropped.
    pub feasible_with_free_slots: bool,
}

/// Layer 2: for each (person, rotation) pair inferred from
/// `rotation_assignments`, subtracts Layer 1 pre-commits from every
/// applicable `RotationActivityRequirement` and emits the remaining
/// structural bound.
pub fn build_structural_requirements(
    context: &SchedulingContext,
    rotation_assignments: &[RotationAssignment],
    locked: &[LockedCell],
    free_slot_counts: impl Fn(Uuid, Uuid, Uuid) -> u32,
) -> Vec<StructuralRequirement> {
    let mut out = Vec::new();
    for ra in rotation_assignments {
        let requirements: Vec<_> = context
            .requirements
            .iter()
            .filter(|r| r.rotation_template_id == ra.rotation_template_id)
            .collect();

        for req in requirements {
            let covered = locked
                .iter()
                .filter(|c| {
                    c.person_id == ra.person_id
                        && c.rotation_template_id == ra.rotation_template_id
                        && c.activity_id == req.activity_id
                        && req.applies_to_week(c.week_number)
                })
                .count() as u32;

            let min_remaining = req.min_halfdays.saturating_sub(covered);
            let max_remaining = req.max_halfdays.saturating_sub(covered);
            let target_remaining = req.target_halfdays.saturating_sub(covered);

            let free_slots = free_slot_counts(ra.person_id, ra.rotation_template_id, req.activity_id);
            let feasible = free_slots >= min_remaining;

            out.push(StructuralRequirement {
                rotation_template_id: ra.rotation_template_id,
                activity_id: req.activity_id,
                person_id: ra.person_id,
                min_remaining,
                max_remaining: max_remaining.max(min_remaining),
                target_remaining,
                priority: req.priority,
                feasible_with_free_slots: feasible,
            });
        }
    }
    out
}

/// Layer 3 injection surface: turns structural requirements into
/// `CountInRange` + `SoftPenalty` clauses over the free decision
/// variables for `(person, rotation_template)` — the variable pool does
/// not split variables by activity, so every requirement scoped to the
/// same `(person, rotation_template)` shares the same candidate pool,
/// which is consistent with one rotation assignment driving one
/// dominant activity per free slot in a given run.
pub fn inject_structural_requirements(
    sink: &mut dyn ModelSink,
    requirements: &[StructuralRequirement],
    vars_for: impl Fn(Uuid, Uuid) -> Vec<rsched_constraints::VarId>,
) {
    for req in requirements {
        let vars = vars_for(req.person_id, req.rotation_template_id);
        if vars.is_empty() {
            continue;
        }
        sink.add_clause(
            Clause::CountInRange {
                vars: vars.clone(),
                min: req.min_remaining,
                max: req.max_remaining,
            },
            "l2_structural_requirement",
        );
        if req.priority > 0 {
            // Soft pull toward target: penalize the distance between the
            // achieved count and target by penalizing every unit beyond
            // target in either direction is more than this simple model
            // supports, so the pull is expressed as a preference for
            // *not* exceeding target, scaled by priority.
            if req.target_remaining < req.max_remaining {
                let weight = (req.priority as f64) / 100.0;
                sink.add_clause(
                    Clause::SoftPenalty {
                        vars,
                        weight,
                    },
                    "l2_target_pull",
                );
            }
        }
    }
}

/// Materializes Layer 1's locked cells as final `Assignment` records.
/// Called once per run, before the solver executes, so they can be
/// excluded from the free decision-variable pool.
pub fn locked_cells_as_assignments(
    locked: &[LockedCell],
    now: chrono::DateTime<chrono::Utc>,
    mut next_id: impl FnMut() -> Uuid,
) -> Vec<Assignment> {
    locked
        .iter()
        .map(|cell| {
            let mut assignment = Assignment::new(
                next_id(),
                cell.block_id,
                cell.person_id,
                Some(cell.rotation_template_id),
                cell.activity_id,
                AssignmentRole::Primary,
                now,
            );
            assignment.notes = Some("layer1_protected_pattern".to_string());
            assignment
        })
        .collect()
}

/// `(person_id, block_id)` pairs covered by Layer 1, for the pruner to
/// skip (spec.md §4.2: "not added as decision variables in layer 3").
pub fn locked_cell_keys(locked: &[LockedCell]) -> HashSet<(Uuid, Uuid)> {
    locked.iter().map(|c| (c.person_id, c.block_id)).collect()
}
