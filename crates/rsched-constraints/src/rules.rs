//! The standard ACGME and institutional constraints (spec.md §4.1.2).

use std::collections::{BTreeMap, HashMap};

use uuid::Uuid;

use rsched_domain::{Assignment, AssignmentRole, SchedulingContext};

use crate::constraint::{Constraint, ConstraintPriority, ConstraintResult, ConstraintType};
use crate::model::{Clause, DecisionVars, ModelSink};
use crate::severity::Severity;
use crate::violation::Violation;

fn group_by_person(assignments: &[Assignment]) -> HashMap<Uuid, Vec<&Assignment>> {
    let mut by_person: HashMap<Uuid, Vec<&Assignment>> = HashMap::new();
    for a in assignments {
        by_person.entry(a.person_id).or_default().push(a);
    }
    by_person
}

/// For each `(person, block)`, if the person is absent on that block's
/// date, no assignment may reference them.
pub struct AvailabilityConstraint {
    pub name: String,
}

impl Default for AvailabilityConstraint {
    fn default() -> Self {
        Self {
            name: "availability".to_string(),
        }
    }
}

impl Constraint for AvailabilityConstraint {
    fn name(&self) -> &str {
        &self.name
    }
    fn constraint_type(&self) -> ConstraintType {
        ConstraintType::Availability
    }
    fn priority(&self) -> ConstraintPriority {
        ConstraintPriority::Critical
    }
    fn is_hard(&self) -> bool {
        true
    }

    fn inject(&self, sink: &mut dyn ModelSink, vars: &dyn DecisionVars, context: &SchedulingContext) {
        for person in &context.persons {
            for block in &context.blocks {
                if !context.is_absent(person.id, block.date) {
                    continue;
                }
                for template in &context.templates {
                    if let Some(v) = vars.var(person.id, block.id, template.id) {
                        sink.add_clause(Clause::Forbid(v), &self.name);
                    }
                }
            }
        }
    }

    fn validate(&self, assignments: &[Assignment], context: &SchedulingContext) -> ConstraintResult {
        let mut violations = Vec::new();
        for a in assignments {
            let Some(block) = context.block(a.block_id) else {
                continue;
            };
            if context.is_absent(a.person_id, block.date) {
                violations.push(
                    Violation::new(
                        &self.name,
                        self.constraint_type(),
                        Severity::Critical,
                        format!("person {} assigned while absent on {}", a.person_id, block.date),
                        f64::INFINITY,
                    )
                    .with_person(a.person_id)
                    .with_block(block.id),
                );
            }
        }
        if violations.is_empty() {
            ConstraintResult::ok()
        } else {
            ConstraintResult::hard_violation(violations)
        }
    }
}

/// `(block, person)` assignments are unique: a person occupies at most
/// one slot per block.
pub struct OnePersonPerBlock {
    pub name: String,
}

impl Default for OnePersonPerBlock {
    fn default() -> Self {
        Self {
            name: "one_person_per_block".to_string(),
        }
    }
}

impl Constraint for OnePersonPerBlock {
    fn name(&self) -> &str {
        &self.name
    }
    fn constraint_type(&self) -> ConstraintType {
        ConstraintType::Capacity
    }
    fn priority(&self) -> ConstraintPriority {
        ConstraintPriority::Critical
    }
    fn is_hard(&self) -> bool {
        true
    }

    fn inject(&self, sink: &mut dyn ModelSink, vars: &dyn DecisionVars, context: &SchedulingContext) {
        for person in &context.persons {
            for block in &context.blocks {
                let row: Vec<_> = context
                    .templates
                    .iter()
                    .filter_map(|t| vars.var(person.id, block.id, t.id))
                    .collect();
                if row.len() > 1 {
                    sink.add_clause(Clause::AtMostOne(row), &self.name);
                }
            }
        }
    }

    fn validate(&self, assignments: &[Assignment], _context: &SchedulingContext) -> ConstraintResult {
        let mut seen = std::collections::HashSet::new();
        let mut violations = Vec::new();
        for a in assignments {
            if !seen.insert(a.occupancy_key()) {
                violations.push(
                    Violation::new(
                        &self.name,
                        self.constraint_type(),
                        Severity::Critical,
                        format!("person {} double-booked on block {}", a.person_id, a.block_id),
                        f64::INFINITY,
                    )
                    .with_person(a.person_id)
                    .with_block(a.block_id),
                );
            }
        }
        if violations.is_empty() {
            ConstraintResult::ok()
        } else {
            ConstraintResult::hard_violation(violations)
        }
    }
}

/// Average duty hours over any rolling 4-week window must not exceed
/// 80h/week. Nominal hours per activity are configuration — the spec's
/// Open Question notes this table is not given in the source; callers
/// must build it from their own activity catalog or construction fails.
pub struct DutyHoursConstraint {
    pub name: String,
    nominal_hours: BTreeMap<Uuid, f64>,
}

impl DutyHoursConstraint {
    pub fn new(nominal_hours: BTreeMap<Uuid, f64>) -> crate::error::Result<Self> {
        if nominal_hours.is_empty() {
            return Err(crate::error::ConstraintError::InvalidConfiguration(
                "nominal hours-per-activity table must not be empty".to_string(),
            ));
        }
        Ok(Self {
            name: "80_hour_rule".to_string(),
            nominal_hours,
        })
    }

    fn hours_for(&self, activity_id: Uuid) -> Option<f64> {
        self.nominal_hours.get(&activity_id).copied()
    }
}

const ROLLING_WINDOW_DAYS: i64 = 28;

impl Constraint for DutyHoursConstraint {
    fn name(&self) -> &str {
        &self.name
    }
    fn constraint_type(&self) -> ConstraintType {
        ConstraintType::DutyHours
    }
    fn priority(&self) -> ConstraintPriority {
        ConstraintPriority::Critical
    }
    fn is_hard(&self) -> bool {
        true
    }

    fn inject(&self, _sink: &mut dyn ModelSink, _vars: &dyn DecisionVars, _context: &SchedulingContext) {
        // Rolling-window duty-hour bounds are evaluated post-solve by
        // `validate`; the greedy backend does not encode them as clauses.
    }

    fn validate(&self, assignments: &[Assignment], context: &SchedulingContext) -> ConstraintResult {
        let mut violations = Vec::new();
        for (person_id, person_assignments) in group_by_person(assignments) {
            let mut dated: Vec<(chrono::NaiveDate, f64)> = Vec::new();
            let mut missing_config = false;
            for a in &person_assignments {
                let Some(block) = context.block(a.block_id) else {
                    continue;
                };
                match self.hours_for(a.effective_activity_id()) {
                    Some(h) => dated.push((block.date, h)),
                    None => missing_config = true,
                }
            }
            if missing_config {
                violations.push(Violation::new(
                    &self.name,
                    self.constraint_type(),
                    Severity::Critical,
                    "nominal hours configuration missing for one or more activities",
                    f64::INFINITY,
                ).with_person(person_id));
            }
            dated.sort_by_key(|(d, _)| *d);
            for (window_start, _) in &dated {
                let window_end = *window_start + chrono::Duration::days(ROLLING_WINDOW_DAYS - 1);
                let total: f64 = dated
                    .iter()
                    .filter(|(d, _)| *d >= *window_start && *d <= window_end)
                    .map(|(_, h)| h)
                    .sum();
                let avg_weekly = total / 4.0;
                if avg_weekly > 80.0 {
                    violations.push(
                        Violation::new(
                            &self.name,
                            self.constraint_type(),
                            Severity::Critical,
                            format!(
                                "person {person_id} averages {avg_weekly:.1}h/week in window starting {window_start}"
                            ),
                            f64::INFINITY,
                        )
                        .with_person(person_id)
                        .with_detail("window_start", window_start.to_string())
                        .with_detail("average_weekly_hours", avg_weekly),
                    );
                }
            }
        }
        if violations.is_empty() {
            ConstraintResult::ok()
        } else {
            ConstraintResult::hard_violation(violations)
        }
    }
}

/// Over any rolling 4-week window, at least one 24-hour period per 7
/// days must be duty-free.
pub struct OneInSevenRule {
    pub name: String,
}

impl Default for OneInSevenRule {
    fn default() -> Self {
        Self {
            name: "1_in_7_rule".to_string(),
        }
    }
}

impl Constraint for OneInSevenRule {
    fn name(&self) -> &str {
        &self.name
    }
    fn constraint_type(&self) -> ConstraintType {
        ConstraintType::ConsecutiveDays
    }
    fn priority(&self) -> ConstraintPriority {
        ConstraintPriority::Critical
    }
    fn is_hard(&self) -> bool {
        true
    }

    fn inject(&self, _sink: &mut dyn ModelSink, _vars: &dyn DecisionVars, _context: &SchedulingContext) {}

    fn validate(&self, assignments: &[Assignment], context: &SchedulingContext) -> ConstraintResult {
        let mut violations = Vec::new();
        for (person_id, person_assignments) in group_by_person(assignments) {
            let mut duty_dates: std::collections::BTreeSet<chrono::NaiveDate> =
                std::collections::BTreeSet::new();
            for a in &person_assignments {
                if let Some(block) = context.block(a.block_id) {
                    duty_dates.insert(block.date);
                }
            }
            for window_start in &duty_dates {
                // Check each 7-day sub-window within the 4-week window has
                // at least one free day.
                let mut rest_found_everywhere = true;
                for sub_start in 0..(ROLLING_WINDOW_DAYS - 6) {
                    let has_free_day = (0..7).any(|d| {
                        let date = *window_start + chrono::Duration::days(sub_start + d);
                        !duty_dates.contains(&date)
                    });
                    if !has_free_day {
                        rest_found_everywhere = false;
                        break;
                    }
                }
                if !rest_found_everywhere {
                    violations.push(
                        Violation::new(
                            &self.name,
                            self.constraint_type(),
                            Severity::Critical,
                            format!(
                                "person {person_id} has no duty-free 24h period in any 7-day span of the window starting {window_start}"
                            ),
                            f64::INFINITY,
                        )
                        .with_person(person_id),
                    );
                    break;
                }
            }
        }
        if violations.is_empty() {
            ConstraintResult::ok()
        } else {
            ConstraintResult::hard_violation(violations)
        }
    }
}

/// For every `(block, rotation)` with `supervision_required`, primary
/// residents assigned must not exceed `max_supervision_ratio *
/// supervising faculty present`.
pub struct SupervisionRatio {
    pub name: String,
}

impl Default for SupervisionRatio {
    fn default() -> Self {
        Self {
            name: "supervision_ratio".to_string(),
        }
    }
}

impl Constraint for SupervisionRatio {
    fn name(&self) -> &str {
        &self.name
    }
    fn constraint_type(&self) -> ConstraintType {
        ConstraintType::Supervision
    }
    fn priority(&self) -> ConstraintPriority {
        ConstraintPriority::Critical
    }
    fn is_hard(&self) -> bool {
        true
    }

    fn inject(&self, _sink: &mut dyn ModelSink, _vars: &dyn DecisionVars, _context: &SchedulingContext) {
        // Expressed as a post-solve ratio check; encoding it as a linear
        // clause would require per-template counting variables the
        // greedy backend does not maintain.
    }

    fn validate(&self, assignments: &[Assignment], context: &SchedulingContext) -> ConstraintResult {
        let mut violations = Vec::new();
        let mut by_block_template: HashMap<(Uuid, Uuid), (u32, u32)> = HashMap::new();
        for a in assignments {
            let Some(template_id) = a.rotation_template_id else {
                continue;
            };
            let Some(template) = context.template(template_id) else {
                continue;
            };
            if !template.supervision_required {
                continue;
            }
            let entry = by_block_template.entry((a.block_id, template_id)).or_insert((0, 0));
            match a.role {
                AssignmentRole::Primary => entry.0 += 1,
                AssignmentRole::Supervising => entry.1 += 1,
                AssignmentRole::Backup => {}
            }
        }
        for ((block_id, template_id), (primary, supervising)) in by_block_template {
            let Some(template) = context.template(template_id) else {
                continue;
            };
            let allowed = template.max_supervision_ratio * supervising;
            if primary > allowed {
                violations.push(
                    Violation::new(
                        &self.name,
                        self.constraint_type(),
                        Severity::Critical,
                        format!(
                            "block {block_id} template {template_id}: {primary} primary residents exceed {allowed} allowed by {supervising} supervising faculty"
                        ),
                        f64::INFINITY,
                    )
                    .with_block(block_id),
                );
            }
        }
        if violations.is_empty() {
            ConstraintResult::ok()
        } else {
            ConstraintResult::hard_violation(violations)
        }
    }
}

/// Block 10 policy: every inpatient block must carry exactly the
/// required headcount. Required headcounts are keyed by
/// `rotation_template_id`, supplied at construction.
pub struct ResidentInpatientHeadcount {
    pub name: String,
    required_headcount: BTreeMap<Uuid, u32>,
}

impl ResidentInpatientHeadcount {
    pub fn new(required_headcount: BTreeMap<Uuid, u32>) -> Self {
        Self {
            name: "resident_inpatient_headcount".to_string(),
            required_headcount,
        }
    }
}

impl Constraint for ResidentInpatientHeadcount {
    fn name(&self) -> &str {
        &self.name
    }
    fn constraint_type(&self) -> ConstraintType {
        ConstraintType::Capacity
    }
    fn priority(&self) -> ConstraintPriority {
        ConstraintPriority::Critical
    }
    fn is_hard(&self) -> bool {
        true
    }

    fn inject(&self, sink: &mut dyn ModelSink, vars: &dyn DecisionVars, context: &SchedulingContext) {
        for (template_id, &headcount) in &self.required_headcount {
            for block in &context.blocks {
                let row: Vec<_> = context
                    .persons
                    .iter()
                    .filter_map(|p| vars.var(p.id, block.id, *template_id))
                    .collect();
                if !row.is_empty() {
                    sink.add_clause(Clause::ExactlyN(row, headcount), &self.name);
                }
            }
        }
    }

    fn validate(&self, assignments: &[Assignment], _context: &SchedulingContext) -> ConstraintResult {
        let mut counts: HashMap<(Uuid, Uuid), u32> = HashMap::new();
        for a in assignments {
            let Some(template_id) = a.rotation_template_id else {
                continue;
            };
            if self.required_headcount.contains_key(&template_id) {
                *counts.entry((a.block_id, template_id)).or_insert(0) += 1;
            }
        }
        let mut violations = Vec::new();
        for ((block_id, template_id), count) in counts {
            let required = self.required_headcount[&template_id];
            if count != required {
                violations.push(
                    Violation::new(
                        &self.name,
                        self.constraint_type(),
                        Severity::Critical,
                        format!(
                            "block {block_id} template {template_id}: headcount {count} != required {required}"
                        ),
                        f64::INFINITY,
                    )
                    .with_block(block_id),
                );
            }
        }
        if violations.is_empty() {
            ConstraintResult::ok()
        } else {
            ConstraintResult::hard_violation(violations)
        }
    }
}

/// A resident who ended FMIT on Saturday cannot be assigned any duty the
/// immediately following Sunday. Matches the protected set's
/// `display_abbreviation` case-insensitively.
pub struct PostFmitSundayBlocking {
    pub name: String,
    fmit_template_ids: std::collections::BTreeSet<Uuid>,
}

impl PostFmitSundayBlocking {
    pub fn new(fmit_template_ids: std::collections::BTreeSet<Uuid>) -> Self {
        Self {
            name: "post_fmit_sunday_blocking".to_string(),
            fmit_template_ids,
        }
    }
}

impl Constraint for PostFmitSundayBlocking {
    fn name(&self) -> &str {
        &self.name
    }
    fn constraint_type(&self) -> ConstraintType {
        ConstraintType::Rotation
    }
    fn priority(&self) -> ConstraintPriority {
        ConstraintPriority::Critical
    }
    fn is_hard(&self) -> bool {
        true
    }

    fn inject(&self, sink: &mut dyn ModelSink, vars: &dyn DecisionVars, context: &SchedulingContext) {
        for person in &context.persons {
            for block in &context.blocks {
                if block.date.weekday() != chrono::Weekday::Sat {
                    continue;
                }
                let was_on_fmit = self
                    .fmit_template_ids
                    .iter()
                    .any(|t| vars.var(person.id, block.id, *t).is_some());
                if !was_on_fmit {
                    continue;
                }
                let sunday = block.date.succ_opt().expect("date within representable range");
                for sunday_block in context.blocks_on(sunday) {
                    for template in &context.templates {
                        if let Some(v) = vars.var(person.id, sunday_block.id, template.id) {
                            sink.add_clause(Clause::Forbid(v), &self.name);
                        }
                    }
                }
            }
        }
    }

    fn validate(&self, assignments: &[Assignment], context: &SchedulingContext) -> ConstraintResult {
        let mut by_person_date: HashMap<(Uuid, chrono::NaiveDate), Vec<&Assignment>> = HashMap::new();
        for a in assignments {
            if let Some(block) = context.block(a.block_id) {
                by_person_date.entry((a.person_id, block.date)).or_default().push(a);
            }
        }
        let mut violations = Vec::new();
        for ((person_id, date), day_assignments) in &by_person_date {
            if date.weekday() != chrono::Weekday::Sat {
                continue;
            }
            let on_fmit = day_assignments
                .iter()
                .any(|a| a.rotation_template_id.is_some_and(|t| self.fmit_template_ids.contains(&t)));
            if !on_fmit {
                continue;
            }
            let sunday = date.succ_opt().expect("date within representable range");
            if by_person_date.contains_key(&(*person_id, sunday)) {
                violations.push(
                    Violation::new(
                        &self.name,
                        self.constraint_type(),
                        Severity::Critical,
                        format!("person {person_id} assigned duty on {sunday} after FMIT ending {date}"),
                        f64::INFINITY,
                    )
                    .with_person(*person_id),
                );
            }
        }
        if violations.is_empty() {
            ConstraintResult::ok()
        } else {
            ConstraintResult::hard_violation(violations)
        }
    }
}

/// If a person has a prerequisite rotation on day `d`, a required
/// follow-up rotation must be assigned within `max_gap_days` of `d`.
pub struct SequenceConstraint {
    pub name: String,
    pub prereq_template_id: Uuid,
    pub followup_template_id: Uuid,
    pub max_gap_days: i64,
}

impl SequenceConstraint {
    pub fn new(
        name: impl Into<String>,
        prereq_template_id: Uuid,
        followup_template_id: Uuid,
        max_gap_days: i64,
    ) -> Self {
        Self {
            name: name.into(),
            prereq_template_id,
            followup_template_id,
            max_gap_days,
        }
    }
}

impl Constraint for SequenceConstraint {
    fn name(&self) -> &str {
        &self.name
    }
    fn constraint_type(&self) -> ConstraintType {
        ConstraintType::Rotation
    }
    fn priority(&self) -> ConstraintPriority {
        ConstraintPriority::Critical
    }
    fn is_hard(&self) -> bool {
        true
    }

    fn inject(&self, sink: &mut dyn ModelSink, vars: &dyn DecisionVars, context: &SchedulingContext) {
        for person in &context.persons {
            for block in &context.blocks {
                let Some(prereq_var) = vars.var(person.id, block.id, self.prereq_template_id) else {
                    continue;
                };
                let window_end = block.date + chrono::Duration::days(self.max_gap_days);
                let mut consequents = Vec::new();
                let mut d = block.date;
                while d <= window_end {
                    for b in context.blocks_on(d) {
                        if let Some(v) = vars.var(person.id, b.id, self.followup_template_id) {
                            consequents.push(v);
                        }
                    }
                    d = d.succ_opt().expect("date within representable range");
                }
                if !consequents.is_empty() {
                    sink.add_clause(
                        Clause::Implication {
                            antecedent: prereq_var,
                            consequents,
                        },
                        &self.name,
                    );
                }
            }
        }
    }

    fn validate(&self, assignments: &[Assignment], context: &SchedulingContext) -> ConstraintResult {
        let mut violations = Vec::new();
        for a in assignments {
            if a.rotation_template_id != Some(self.prereq_template_id) {
                continue;
            }
            let Some(block) = context.block(a.block_id) else {
                continue;
            };
            let window_end = block.date + chrono::Duration::days(self.max_gap_days);
            let satisfied = assignments.iter().any(|other| {
                other.person_id == a.person_id
                    && other.rotation_template_id == Some(self.followup_template_id)
                    && context
                        .block(other.block_id)
                        .is_some_and(|b| b.date > block.date && b.date <= window_end)
            });
            if !satisfied {
                violations.push(
                    Violation::new(
                        &self.name,
                        self.constraint_type(),
                        Severity::Critical,
                        format!(
                            "person {} has prerequisite on {} with no follow-up within {} days",
                            a.person_id, block.date, self.max_gap_days
                        ),
                        f64::INFINITY,
                    )
                    .with_person(a.person_id),
                );
            }
        }
        if violations.is_empty() {
            ConstraintResult::ok()
        } else {
            ConstraintResult::hard_violation(violations)
        }
    }
}

fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64
}

/// Across eligible faculty, minimize variance of Sunday call counts.
pub struct SundayCallEquityConstraint {
    pub name: String,
    pub weight: f64,
}

impl Default for SundayCallEquityConstraint {
    fn default() -> Self {
        Self {
            name: "sunday_call_equity".to_string(),
            weight: 10.0,
        }
    }
}

impl Constraint for SundayCallEquityConstraint {
    fn name(&self) -> &str {
        &self.name
    }
    fn constraint_type(&self) -> ConstraintType {
        ConstraintType::Equity
    }
    fn priority(&self) -> ConstraintPriority {
        ConstraintPriority::Medium
    }
    fn is_hard(&self) -> bool {
        false
    }
    fn weight(&self) -> f64 {
        self.weight
    }

    fn inject(&self, _sink: &mut dyn ModelSink, _vars: &dyn DecisionVars, _context: &SchedulingContext) {}

    fn validate(&self, assignments: &[Assignment], context: &SchedulingContext) -> ConstraintResult {
        let mut counts: HashMap<Uuid, f64> = HashMap::new();
        for person in &context.persons {
            if person.is_resident() {
                continue;
            }
            counts.entry(person.id).or_insert(0.0);
        }
        for a in assignments {
            let Some(block) = context.block(a.block_id) else {
                continue;
            };
            if block.date.weekday() == chrono::Weekday::Sun {
                *counts.entry(a.person_id).or_insert(0.0) += 1.0;
            }
        }
        let values: Vec<f64> = counts.values().copied().collect();
        let var = variance(&values);
        let penalty = self.weight * var * self.priority().value() as f64;
        if var <= f64::EPSILON {
            ConstraintResult::ok()
        } else {
            ConstraintResult::soft_violation(
                vec![Violation::new(
                    &self.name,
                    self.constraint_type(),
                    Severity::Medium,
                    format!("Sunday call variance {var:.3} across {} faculty", values.len()),
                    penalty,
                )],
                penalty,
            )
        }
    }
}

/// Minimum days between successive calls for the same person.
pub struct CallSpacingConstraint {
    pub name: String,
    pub weight: f64,
    pub min_days_between_calls: i64,
}

impl CallSpacingConstraint {
    pub fn new(min_days_between_calls: i64) -> Self {
        Self {
            name: "call_spacing".to_string(),
            weight: 8.0,
            min_days_between_calls,
        }
    }
}

impl Constraint for CallSpacingConstraint {
    fn name(&self) -> &str {
        &self.name
    }
    fn constraint_type(&self) -> ConstraintType {
        ConstraintType::Call
    }
    fn priority(&self) -> ConstraintPriority {
        ConstraintPriority::Medium
    }
    fn is_hard(&self) -> bool {
        false
    }
    fn weight(&self) -> f64 {
        self.weight
    }

    fn inject(&self, _sink: &mut dyn ModelSink, _vars: &dyn DecisionVars, _context: &SchedulingContext) {}

    fn validate(&self, _assignments: &[Assignment], context: &SchedulingContext) -> ConstraintResult {
        let mut by_person: HashMap<Uuid, Vec<chrono::NaiveDate>> = HashMap::new();
        for call in &context.call_assignments {
            by_person.entry(call.person_id).or_default().push(call.date);
        }
        let mut violation_count = 0u32;
        let mut violations = Vec::new();
        for (person_id, mut dates) in by_person {
            dates.sort();
            for pair in dates.windows(2) {
                let gap = (pair[1] - pair[0]).num_days();
                if gap < self.min_days_between_calls {
                    violation_count += 1;
                    violations.push(
                        Violation::new(
                            &self.name,
                            self.constraint_type(),
                            Severity::Low,
                            format!("person {person_id} has only {gap}d between calls on {} and {}", pair[0], pair[1]),
                            0.0,
                        )
                        .with_person(person_id),
                    );
                }
            }
        }
        let penalty = self.weight * violation_count as f64 * self.priority().value() as f64;
        for v in &mut violations {
            v.penalty = penalty / violation_count.max(1) as f64;
        }
        ConstraintResult::soft_violation(violations, penalty)
    }
}

/// Minimize weekday call distribution variance.
pub struct WeekdayCallEquityConstraint {
    pub name: String,
    pub weight: f64,
}

impl Default for WeekdayCallEquityConstraint {
    fn default() -> Self {
        Self {
            name: "weekday_call_equity".to_string(),
            weight: 5.0,
        }
    }
}

impl Constraint for WeekdayCallEquityConstraint {
    fn name(&self) -> &str {
        &self.name
    }
    fn constraint_type(&self) -> ConstraintType {
        ConstraintType::Equity
    }
    fn priority(&self) -> ConstraintPriority {
        ConstraintPriority::Medium
    }
    fn is_hard(&self) -> bool {
        false
    }
    fn weight(&self) -> f64 {
        self.weight
    }

    fn inject(&self, _sink: &mut dyn ModelSink, _vars: &dyn DecisionVars, _context: &SchedulingContext) {}

    fn validate(&self, _assignments: &[Assignment], context: &SchedulingContext) -> ConstraintResult {
        let mut counts: HashMap<Uuid, f64> = HashMap::new();
        for call in &context.call_assignments {
            if !matches!(call.date.weekday(), chrono::Weekday::Sat | chrono::Weekday::Sun) {
                *counts.entry(call.person_id).or_insert(0.0) += 1.0;
            }
        }
        let values: Vec<f64> = counts.values().copied().collect();
        let var = variance(&values);
        let penalty = self.weight * var * self.priority().value() as f64;
        if var <= f64::EPSILON {
            ConstraintResult::ok()
        } else {
            ConstraintResult::soft_violation(
                vec![Violation::new(
                    &self.name,
                    self.constraint_type(),
                    Severity::Low,
                    format!("weekday call variance {var:.3} across {} people", values.len()),
                    penalty,
                )],
                penalty,
            )
        }
    }
}

/// Prefer Tuesday placements consistent with academic scheduling.
pub struct TuesdayCallPreferenceConstraint {
    pub name: String,
    pub weight: f64,
}

impl Default for TuesdayCallPreferenceConstraint {
    fn default() -> Self {
        Self {
            name: "tuesday_call_preference".to_string(),
            weight: 2.0,
        }
    }
}

impl Constraint for TuesdayCallPreferenceConstraint {
    fn name(&self) -> &str {
        &self.name
    }
    fn constraint_type(&self) -> ConstraintType {
        ConstraintType::Preference
    }
    fn priority(&self) -> ConstraintPriority {
        ConstraintPriority::Low
    }
    fn is_hard(&self) -> bool {
        false
    }
    fn weight(&self) -> f64 {
        self.weight
    }

    fn inject(&self, _sink: &mut dyn ModelSink, _vars: &dyn DecisionVars, _context: &SchedulingContext) {}

    fn validate(&self, _assignments: &[Assignment], context: &SchedulingContext) -> ConstraintResult {
        let non_tuesday = context
            .call_assignments
            .iter()
            .filter(|c| c.date.weekday() != chrono::Weekday::Tue)
            .count() as f64;
        if non_tuesday == 0.0 {
            return ConstraintResult::ok();
        }
        let penalty = self.weight * non_tuesday * self.priority().value() as f64;
        ConstraintResult::soft_violation(
            vec![Violation::new(
                &self.name,
                self.constraint_type(),
                Severity::Low,
                format!("{non_tuesday} call assignments placed off Tuesday"),
                penalty,
            )],
            penalty,
        )
    }
}

/// Penalize over-assignment of N-1-vulnerable, high-hub-score faculty.
/// A no-op when the context carries no resilience data
/// (`ResilienceData::has_data`), so it is safe to include by default in
/// `create_resilience_aware()`.
pub struct HubProtectionConstraint {
    pub name: String,
    pub weight: f64,
    /// Hub score above which a faculty member is considered critical.
    pub hub_score_threshold: f64,
    /// Assignment count above which an N-1-vulnerable hub is over-loaded.
    pub max_assignments: usize,
}

impl Default for HubProtectionConstraint {
    fn default() -> Self {
        Self {
            name: "hub_protection".to_string(),
            weight: 8.0,
            hub_score_threshold: 0.7,
            max_assignments: 8,
        }
    }
}

impl Constraint for HubProtectionConstraint {
    fn name(&self) -> &str {
        &self.name
    }
    fn constraint_type(&self) -> ConstraintType {
        ConstraintType::HubProtection
    }
    fn priority(&self) -> ConstraintPriority {
        ConstraintPriority::High
    }
    fn is_hard(&self) -> bool {
        false
    }
    fn weight(&self) -> f64 {
        self.weight
    }

    fn inject(&self, _sink: &mut dyn ModelSink, _vars: &dyn DecisionVars, _context: &SchedulingContext) {}

    fn validate(&self, assignments: &[Assignment], context: &SchedulingContext) -> ConstraintResult {
        if !context.resilience.has_data() {
            return ConstraintResult::ok();
        }
        let by_person = group_by_person(assignments);
        let mut violations = Vec::new();
        for (&person_id, theirs) in &by_person {
            if !context.resilience.is_n1_vulnerable(person_id) {
                continue;
            }
            let hub_score = context.resilience.hub_score(person_id);
            if hub_score < self.hub_score_threshold || theirs.len() <= self.max_assignments {
                continue;
            }
            let overage = (theirs.len() - self.max_assignments) as f64;
            let penalty = self.weight * overage * hub_score * self.priority().value() as f64;
            violations.push(
                Violation::new(
                    &self.name,
                    self.constraint_type(),
                    Severity::Medium,
                    format!(
                        "n1-vulnerable hub {person_id} (score {hub_score:.2}) carries {} assignments, over the {} buffer",
                        theirs.len(),
                        self.max_assignments
                    ),
                    penalty,
                )
                .with_person(person_id),
            );
        }
        if violations.is_empty() {
            return ConstraintResult::ok();
        }
        let penalty = violations.iter().map(|v| v.penalty).sum();
        ConstraintResult::soft_violation(violations, penalty)
    }
}

/// Keep projected system utilization within a buffer below
/// `ResilienceData::target_utilization`, rather than scheduling flush to
/// capacity — a system with no slack cannot absorb an unplanned absence.
pub struct UtilizationBufferConstraint {
    pub name: String,
    pub weight: f64,
}

impl Default for UtilizationBufferConstraint {
    fn default() -> Self {
        Self {
            name: "utilization_buffer".to_string(),
            weight: 6.0,
        }
    }
}

impl Constraint for UtilizationBufferConstraint {
    fn name(&self) -> &str {
        &self.name
    }
    fn constraint_type(&self) -> ConstraintType {
        ConstraintType::UtilizationBuffer
    }
    fn priority(&self) -> ConstraintPriority {
        ConstraintPriority::Medium
    }
    fn is_hard(&self) -> bool {
        false
    }
    fn weight(&self) -> f64 {
        self.weight
    }

    fn inject(&self, _sink: &mut dyn ModelSink, _vars: &dyn DecisionVars, _context: &SchedulingContext) {}

    fn validate(&self, _assignments: &[Assignment], context: &SchedulingContext) -> ConstraintResult {
        let resilience = &context.resilience;
        if !resilience.has_data() {
            return ConstraintResult::ok();
        }
        let overage = resilience.current_utilization - resilience.target_utilization;
        if overage <= 0.0 {
            return ConstraintResult::ok();
        }
        let penalty = self.weight * overage * self.priority().value() as f64;
        ConstraintResult::soft_violation(
            vec![Violation::new(
                &self.name,
                self.constraint_type(),
                Severity::Medium,
                format!(
                    "utilization {:.0}% exceeds target {:.0}% by {:.0} points",
                    resilience.current_utilization * 100.0,
                    resilience.target_utilization * 100.0,
                    overage * 100.0
                ),
                penalty,
            )],
            penalty,
        )
    }
}

/// Reward placements that follow the stigmergy preference trail faculty
/// have built up for a given activity code, so repeated informal
/// preferences (spec.md §4.1.2 `resilience`) bias future generations the
/// way ants reinforce a path.
pub struct ResilienceConstraint {
    pub name: String,
    pub weight: f64,
}

impl Default for ResilienceConstraint {
    fn default() -> Self {
        Self {
            name: "resilience_preference_trail".to_string(),
            weight: 3.0,
        }
    }
}

impl Constraint for ResilienceConstraint {
    fn name(&self) -> &str {
        &self.name
    }
    fn constraint_type(&self) -> ConstraintType {
        ConstraintType::Resilience
    }
    fn priority(&self) -> ConstraintPriority {
        ConstraintPriority::Low
    }
    fn is_hard(&self) -> bool {
        false
    }
    fn weight(&self) -> f64 {
        self.weight
    }

    fn inject(&self, _sink: &mut dyn ModelSink, _vars: &dyn DecisionVars, _context: &SchedulingContext) {}

    fn validate(&self, assignments: &[Assignment], context: &SchedulingContext) -> ConstraintResult {
        if !context.resilience.has_data() {
            return ConstraintResult::ok();
        }
        let mut off_trail = 0.0;
        for assignment in assignments {
            let Some(activity) = context.activity(assignment.effective_activity_id()) else {
                continue;
            };
            let strength = context
                .resilience
                .preference_strength(assignment.person_id, &activity.code);
            // Below the neutral midpoint (no trail data defaults to 0.5):
            // the placement cuts against what this faculty member has
            // gravitated toward before.
            if strength < 0.5 {
                off_trail += 0.5 - strength;
            }
        }
        if off_trail <= 0.0 {
            return ConstraintResult::ok();
        }
        let penalty = self.weight * off_trail * self.priority().value() as f64;
        ConstraintResult::soft_violation(
            vec![Violation::new(
                &self.name,
                self.constraint_type(),
                Severity::Low,
                format!("{off_trail:.1} aggregate preference-trail mismatch across placements"),
                penalty,
            )],
            penalty,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use rsched_domain::{AbsenceType, Activity, ActivityCategory, Block, Person, TimeOfDay};
    use std::collections::BTreeSet;

    fn context_with(
        persons: Vec<Person>,
        blocks: Vec<Block>,
        activities: Vec<Activity>,
        absences: Vec<rsched_domain::Absence>,
    ) -> SchedulingContext {
        SchedulingContext::new(
            persons,
            blocks,
            vec![],
            activities,
            vec![],
            vec![],
            vec![],
            absences,
            vec![],
            vec![],
            NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
        )
    }

    #[test]
    fn availability_flags_assignment_during_absence() {
        let person = Person::faculty(Uuid::new_v4(), "a@b.c", BTreeSet::new(), false, None);
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let block = Block::new(Uuid::new_v4(), date, TimeOfDay::Am, 1);
        let activity = Activity::new(Uuid::new_v4(), "fm_clinic", "FMC", ActivityCategory::Clinical);
        let absence = rsched_domain::Absence::new(Uuid::new_v4(), person.id, date, date, AbsenceType::Vacation).unwrap();
        let context = context_with(vec![person.clone()], vec![block.clone()], vec![activity.clone()], vec![absence]);

        let assignment = Assignment::new(
            Uuid::new_v4(),
            block.id,
            person.id,
            None,
            activity.id,
            AssignmentRole::Primary,
            Utc::now(),
        );
        let result = AvailabilityConstraint::default().validate(&[assignment], &context);
        assert!(!result.satisfied);
        assert_eq!(result.penalty, f64::INFINITY);
    }

    #[test]
    fn availability_passes_when_not_absent() {
        let person = Person::faculty(Uuid::new_v4(), "a@b.c", BTreeSet::new(), false, None);
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let block = Block::new(Uuid::new_v4(), date, TimeOfDay::Am, 1);
        let activity = Activity::new(Uuid::new_v4(), "fm_clinic", "FMC", ActivityCategory::Clinical);
        let context = context_with(vec![person.clone()], vec![block.clone()], vec![activity.clone()], vec![]);

        let assignment = Assignment::new(
            Uuid::new_v4(),
            block.id,
            person.id,
            None,
            activity.id,
            AssignmentRole::Primary,
            Utc::now(),
        );
        let result = AvailabilityConstraint::default().validate(&[assignment], &context);
        assert!(result.satisfied);
    }

    #[test]
    fn one_person_per_block_flags_double_booking() {
        let person = Person::faculty(Uuid::new_v4(), "a@b.c", BTreeSet::new(), false, None);
        let block_id = Uuid::new_v4();
        let now = Utc::now();
        let a1 = Assignment::new(Uuid::new_v4(), block_id, person.id, None, Uuid::new_v4(), AssignmentRole::Primary, now);
        let a2 = Assignment::new(Uuid::new_v4(), block_id, person.id, None, Uuid::new_v4(), AssignmentRole::Primary, now);
        let context = context_with(vec![person], vec![], vec![], vec![]);
        let result = OnePersonPerBlock::default().validate(&[a1, a2], &context);
        assert!(!result.satisfied);
    }

    fn resilient_context(hub_scores: HashMap<Uuid, f64>, n1_vulnerable: Uuid, utilization: f64, target: f64) -> SchedulingContext {
        let mut context = context_with(vec![], vec![], vec![], vec![]);
        context.resilience.hub_scores = hub_scores;
        context.resilience.n1_vulnerable_faculty = [n1_vulnerable].into_iter().collect();
        context.resilience.current_utilization = utilization;
        context.resilience.target_utilization = target;
        context
    }

    #[test]
    fn hub_protection_is_noop_without_resilience_data() {
        let context = context_with(vec![], vec![], vec![], vec![]);
        let assignments = [];
        let result = HubProtectionConstraint::default().validate(&assignments, &context);
        assert!(result.satisfied);
    }

    #[test]
    fn hub_protection_flags_overloaded_vulnerable_hub() {
        let faculty_id = Uuid::new_v4();
        let context = resilient_context([(faculty_id, 0.9)].into_iter().collect(), faculty_id, 0.0, 0.8);
        let now = Utc::now();
        let assignments: Vec<Assignment> = (0..10)
            .map(|_| Assignment::new(Uuid::new_v4(), Uuid::new_v4(), faculty_id, None, Uuid::new_v4(), AssignmentRole::Primary, now))
            .collect();
        let result = HubProtectionConstraint::default().validate(&assignments, &context);
        assert!(!result.satisfied);
        assert!(result.penalty > 0.0);
    }

    #[test]
    fn utilization_buffer_flags_overage_past_target() {
        let context = resilient_context(HashMap::new(), Uuid::new_v4(), 0.95, 0.80);
        let result = UtilizationBufferConstraint::default().validate(&[], &context);
        assert!(!result.satisfied);
    }

    #[test]
    fn utilization_buffer_ok_under_target() {
        let context = resilient_context([(Uuid::new_v4(), 0.5)].into_iter().collect(), Uuid::new_v4(), 0.70, 0.80);
        let result = UtilizationBufferConstraint::default().validate(&[], &context);
        assert!(result.satisfied);
    }

    #[test]
    fn resilience_preference_trail_rewards_known_trail() {
        let faculty_id = Uuid::new_v4();
        let activity = Activity::new(Uuid::new_v4(), "fm_clinic", "FMC", ActivityCategory::Clinical);
        let mut context = context_with(vec![], vec![], vec![activity.clone()], vec![]);
        context.resilience.hub_scores.insert(faculty_id, 0.1);
        let mut trail = HashMap::new();
        trail.insert(activity.code.clone(), 0.9);
        context.resilience.preference_trails.insert(faculty_id, trail);

        let assignment = Assignment::new(Uuid::new_v4(), Uuid::new_v4(), faculty_id, None, activity.id, AssignmentRole::Primary, Utc::now());
        let result = ResilienceConstraint::default().validate(&[assignment], &context);
        assert!(result.satisfied);
    }
}
