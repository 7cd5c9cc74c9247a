//! SchedulingContext: the read-only snapshot threaded through constraint
//! evaluation and the hybrid layer engine.
//!
//! Built once per generation run from whatever the repository loads for a
//! date range (spec.md §4.9, "Repository Interface"), then never mutated —
//! per the design note in spec.md §9 ("Never mutate shared references;
//! recompute from the repository for each generation run"). Index maps are
//! built eagerly so constraint code never has to linear-scan for a person
//! or block by id.

use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::absence::{Absence, CallAssignment};
use crate::activity::Activity;
use crate::assignment::Assignment;
use crate::block::Block;
use crate::credential::Credential;
use crate::pattern::WeeklyPattern;
use crate::person::Person;
use crate::requirement::RotationActivityRequirement;
use crate::rotation::RotationTemplate;

/// Resilience-family data (spec.md §4.1.2 `create_resilience_aware()`,
/// SPEC_FULL §11). Populated by an external resilience service; defaults
/// to empty/zero so resilience constraints degrade to no-ops when absent.
#[derive(Debug, Clone, Default)]
pub struct ResilienceData {
    /// Hub vulnerability score per faculty id, 0.0-1.0. Higher = more
    /// critical = should be protected from over-assignment.
    pub hub_scores: HashMap<Uuid, f64>,
    /// Current system utilization rate, 0.0-1.0.
    pub current_utilization: f64,
    /// Faculty whose loss would create an N-1 single point of failure.
    pub n1_vulnerable_faculty: HashSet<Uuid>,
    /// Stigmergy preference trails: faculty id -> slot type -> strength.
    pub preference_trails: HashMap<Uuid, HashMap<String, f64>>,
    /// Faculty id -> zone id, for blast-radius isolation.
    pub zone_assignments: HashMap<Uuid, Uuid>,
    /// Block id -> zone id.
    pub block_zones: HashMap<Uuid, Uuid>,
    /// Target utilization for the buffer constraint; default 80%.
    pub target_utilization: f64,
}

impl ResilienceData {
    pub fn has_data(&self) -> bool {
        !self.hub_scores.is_empty() || self.current_utilization > 0.0
    }

    pub fn hub_score(&self, faculty_id: Uuid) -> f64 {
        self.hub_scores.get(&faculty_id).copied().unwrap_or(0.0)
    }

    pub fn is_n1_vulnerable(&self, faculty_id: Uuid) -> bool {
        self.n1_vulnerable_faculty.contains(&faculty_id)
    }

    pub fn preference_strength(&self, faculty_id: Uuid, slot_type: &str) -> f64 {
        self.preference_trails
            .get(&faculty_id)
            .and_then(|m| m.get(slot_type))
            .copied()
            .unwrap_or(0.5)
    }
}

/// Read-only snapshot of every entity relevant to one generation or
/// validation run, plus the index maps built over it.
pub struct SchedulingContext {
    pub persons: Vec<Person>,
    pub blocks: Vec<Block>,
    pub templates: Vec<RotationTemplate>,
    pub activities: Vec<Activity>,
    pub patterns: Vec<WeeklyPattern>,
    pub requirements: Vec<RotationActivityRequirement>,
    pub existing_assignments: Vec<Assignment>,
    pub absences: Vec<Absence>,
    pub call_assignments: Vec<CallAssignment>,
    pub credentials: Vec<Credential>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub resilience: ResilienceData,

    person_idx: HashMap<Uuid, usize>,
    block_idx: HashMap<Uuid, usize>,
    template_idx: HashMap<Uuid, usize>,
    activity_idx: HashMap<Uuid, usize>,
    blocks_by_date: HashMap<NaiveDate, Vec<usize>>,
    absences_by_person: HashMap<Uuid, Vec<usize>>,
}

#[allow(clippy::too_many_arguments)]
impl SchedulingContext {
    pub fn new(
        persons: Vec<Person>,
        blocks: Vec<Block>,
        templates: Vec<RotationTemplate>,
        activities: Vec<Activity>,
        patterns: Vec<WeeklyPattern>,
        requirements: Vec<RotationActivityRequirement>,
        existing_assignments: Vec<Assignment>,
        absences: Vec<Absence>,
        call_assignments: Vec<CallAssignment>,
        credentials: Vec<Credential>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        let person_idx = persons
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id, i))
            .collect();
        let block_idx = blocks.iter().enumerate().map(|(i, b)| (b.id, i)).collect();
        let template_idx = templates
            .iter()
            .enumerate()
            .map(|(i, t)| (t.id, i))
            .collect();
        let activity_idx = activities
            .iter()
            .enumerate()
            .map(|(i, a)| (a.id, i))
            .collect();

        let mut blocks_by_date: HashMap<NaiveDate, Vec<usize>> = HashMap::new();
        for (i, b) in blocks.iter().enumerate() {
            blocks_by_date.entry(b.date).or_default().push(i);
        }

        let mut absences_by_person: HashMap<Uuid, Vec<usize>> = HashMap::new();
        for (i, a) in absences.iter().enumerate() {
            absences_by_person.entry(a.person_id).or_default().push(i);
        }

        Self {
            persons,
            blocks,
            templates,
            activities,
            patterns,
            requirements,
            existing_assignments,
            absences,
            call_assignments,
            credentials,
            start_date,
            end_date,
            resilience: ResilienceData {
                target_utilization: 0.80,
                ..Default::default()
            },
            person_idx,
            block_idx,
            template_idx,
            activity_idx,
            blocks_by_date,
            absences_by_person,
        }
    }

    pub fn person(&self, id: Uuid) -> Option<&Person> {
        self.person_idx.get(&id).map(|&i| &self.persons[i])
    }

    pub fn block(&self, id: Uuid) -> Option<&Block> {
        self.block_idx.get(&id).map(|&i| &self.blocks[i])
    }

    pub fn template(&self, id: Uuid) -> Option<&RotationTemplate> {
        self.template_idx.get(&id).map(|&i| &self.templates[i])
    }

    pub fn activity(&self, id: Uuid) -> Option<&Activity> {
        self.activity_idx.get(&id).map(|&i| &self.activities[i])
    }

    pub fn blocks_on(&self, date: NaiveDate) -> impl Iterator<Item = &Block> {
        self.blocks_by_date
            .get(&date)
            .into_iter()
            .flatten()
            .map(move |&i| &self.blocks[i])
    }

    /// Whether `person_id` is absent for `date`, per any loaded `Absence`.
    pub fn is_absent(&self, person_id: Uuid, date: NaiveDate) -> bool {
        self.absences_by_person
            .get(&person_id)
            .into_iter()
            .flatten()
            .any(|&i| self.absences[i].covers(date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::TimeOfDay;

    #[test]
    fn index_maps_resolve_entities() {
        let person_id = Uuid::new_v4();
        let person = Person::faculty(person_id, "a@b.c", Default::default(), false, None);
        let block_id = Uuid::new_v4();
        let block = Block::new(
            block_id,
            NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            TimeOfDay::Am,
            1,
        );
        let ctx = SchedulingContext::new(
            vec![person],
            vec![block],
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
        assert!(ctx.person(person_id).is_some());
        assert!(ctx.block(block_id).is_some());
        assert!(ctx.person(Uuid::new_v4()).is_none());
    }

    #[test]
    fn empty_context_is_valid() {
        let ctx = SchedulingContext::new(
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
        assert_eq!(ctx.persons.len(), 0);
    }
}
