//! `InMemoryRepository`: a process-local `Repository` backed by
//! `Mutex`-guarded vectors and maps. Sufficient for tests and for
//! exercising the engine/core crates without a real database.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use rsched_domain::{
    Absence, Activity, ApprovalRecord, Assignment, Block, CallAssignment, Credential,
    RotationActivityRequirement, RotationTemplate, ScheduleOverride, SchedulingContext, TimeOfDay,
    WeeklyPattern,
};

use crate::error::{RepositoryError, Result};
use crate::Repository;

#[derive(Default)]
struct Store {
    persons: Vec<rsched_domain::Person>,
    blocks: Vec<Block>,
    templates: Vec<RotationTemplate>,
    activities: Vec<Activity>,
    patterns: Vec<WeeklyPattern>,
    requirements: Vec<RotationActivityRequirement>,
    absences: Vec<Absence>,
    call_assignments: Vec<CallAssignment>,
    credentials: Vec<Credential>,

    assignments: HashMap<Uuid, Assignment>,
    run_assignment_ids: HashMap<Uuid, Vec<Uuid>>,
    overrides: HashMap<Uuid, ScheduleOverride>,
    chains: HashMap<String, Vec<ApprovalRecord>>,
}

/// A usable in-memory `Repository`. Construct with [`InMemoryRepository::new`]
/// seeded from the fixture data a test or demo needs; subsequent writes go
/// through the `Repository` trait methods (`write_assignments`,
/// `append_approval`, `write_override`, ...) the same way a real store's
/// would.
pub struct InMemoryRepository {
    store: Mutex<Store>,
}

#[allow(clippy::too_many_arguments)]
impl InMemoryRepository {
    pub fn new(
        persons: Vec<rsched_domain::Person>,
        blocks: Vec<Block>,
        templates: Vec<RotationTemplate>,
        activities: Vec<Activity>,
        patterns: Vec<WeeklyPattern>,
        requirements: Vec<RotationActivityRequirement>,
        absences: Vec<Absence>,
        call_assignments: Vec<CallAssignment>,
        credentials: Vec<Credential>,
    ) -> Self {
        Self {
            store: Mutex::new(Store {
                persons,
                blocks,
                templates,
                activities,
                patterns,
                requirements,
                absences,
                call_assignments,
                credentials,
                ..Default::default()
            }),
        }
    }

    pub fn empty() -> Self {
        Self {
            store: Mutex::new(Store::default()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Store> {
        self.store.lock().expect("repository mutex poisoned")
    }
}

impl Repository for InMemoryRepository {
    fn load_context(&self, date_range: (NaiveDate, NaiveDate)) -> Result<SchedulingContext> {
        let store = self.lock();
        let (start, end) = date_range;
        let blocks: Vec<Block> = store
            .blocks
            .iter()
            .filter(|b| b.date >= start && b.date <= end)
            .cloned()
            .collect();
        let existing_assignments: Vec<Assignment> = store
            .assignments
            .values()
            .filter(|a| blocks.iter().any(|b| b.id == a.block_id))
            .cloned()
            .collect();

        Ok(SchedulingContext::new(
            store.persons.clone(),
            blocks,
            store.templates.clone(),
            store.activities.clone(),
            store.patterns.clone(),
            store.requirements.clone(),
            existing_assignments,
            store.absences.clone(),
            store.call_assignments.clone(),
            store.credentials.clone(),
            start,
            end,
        ))
    }

    fn write_assignments(&self, run_id: Uuid, assignments: Vec<Assignment>) -> Result<()> {
        let mut store = self.lock();
        if let Some(prior_ids) = store.run_assignment_ids.remove(&run_id) {
            for id in prior_ids {
                store.assignments.remove(&id);
            }
        }
        let ids = assignments.iter().map(|a| a.id).collect();
        for assignment in assignments {
            store.assignments.insert(assignment.id, assignment);
        }
        store.run_assignment_ids.insert(run_id, ids);
        Ok(())
    }

    fn append_approval(&self, record: ApprovalRecord) -> Result<()> {
        let mut store = self.lock();
        let chain = store.chains.entry(record.chain_id.clone()).or_default();
        if chain.iter().any(|r| r.sequence_num == record.sequence_num) {
            return Err(RepositoryError::Conflict(format!(
                "chain {} already has sequence_num {}",
                record.chain_id, record.sequence_num
            )));
        }
        chain.push(record);
        Ok(())
    }

    fn read_chain(&self, chain_id: &str) -> Result<Vec<ApprovalRecord>> {
        let store = self.lock();
        let mut records = store.chains.get(chain_id).cloned().unwrap_or_default();
        records.sort_by_key(|r| r.sequence_num);
        Ok(records)
    }

    fn get_assignment(&self, id: Uuid) -> Result<Assignment> {
        self.lock()
            .assignments
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(format!("assignment {id}")))
    }

    fn get_activity(&self, id: Uuid) -> Result<Activity> {
        self.lock()
            .activities
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(format!("activity {id}")))
    }

    fn get_block(&self, id: Uuid) -> Result<Block> {
        self.lock()
            .blocks
            .iter()
            .find(|b| b.id == id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(format!("block {id}")))
    }

    fn get_rotation_template(&self, id: Uuid) -> Result<RotationTemplate> {
        self.lock()
            .templates
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(format!("rotation template {id}")))
    }

    fn get_credential(&self, person_id: Uuid, procedure: &str) -> Result<Option<Credential>> {
        Ok(self
            .lock()
            .credentials
            .iter()
            .find(|c| c.person_id == person_id && c.procedure == procedure)
            .cloned())
    }

    fn active_override_for_assignment(&self, assignment_id: Uuid) -> Result<Option<ScheduleOverride>> {
        Ok(self
            .lock()
            .overrides
            .values()
            .find(|o| o.assignment_id == assignment_id && o.is_active)
            .cloned())
    }

    fn booking_for_person_at(
        &self,
        person_id: Uuid,
        date: NaiveDate,
        time_of_day: TimeOfDay,
        exclude_assignment_id: Uuid,
    ) -> Result<Option<Assignment>> {
        let store = self.lock();
        for assignment in store.assignments.values() {
            if assignment.id == exclude_assignment_id || assignment.person_id != person_id {
                continue;
            }
            if let Some(block) = store.blocks.iter().find(|b| b.id == assignment.block_id) {
                if block.date == date && block.time_of_day == time_of_day {
                    return Ok(Some(assignment.clone()));
                }
            }
        }
        Ok(None)
    }

    fn write_override(&self, override_record: ScheduleOverride) -> Result<()> {
        self.lock().overrides.insert(override_record.id, override_record);
        Ok(())
    }

    fn deactivate_override(&self, id: Uuid, by: Uuid, now: DateTime<Utc>) -> Result<()> {
        let mut store = self.lock();
        let override_record = store
            .overrides
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::NotFound(format!("override {id}")))?;
        override_record.deactivate(by, now);
        Ok(())
    }

    fn get_override(&self, id: Uuid) -> Result<ScheduleOverride> {
        self.lock()
            .overrides
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(format!("override {id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsched_domain::{AssignmentRole, Person};
    use std::collections::BTreeSet;

    #[test]
    fn write_assignments_is_idempotent_per_run_id() {
        let repo = InMemoryRepository::empty();
        let run_id = Uuid::new_v4();
        let person = Person::faculty(Uuid::new_v4(), "a@b.c", BTreeSet::new(), false, None);
        let block_id = Uuid::new_v4();
        let assignment = Assignment::new(
            Uuid::new_v4(),
            block_id,
            person.id,
            None,
            Uuid::new_v4(),
            AssignmentRole::Primary,
            Utc::now(),
        );
        repo.write_assignments(run_id, vec![assignment.clone()]).unwrap();
        assert!(repo.get_assignment(assignment.id).is_ok());

        let replacement = Assignment::new(
            Uuid::new_v4(),
            block_id,
            person.id,
            None,
            Uuid::new_v4(),
            AssignmentRole::Primary,
            Utc::now(),
        );
        repo.write_assignments(run_id, vec![replacement.clone()]).unwrap();
        assert!(repo.get_assignment(assignment.id).is_err());
        assert!(repo.get_assignment(replacement.id).is_ok());
    }

    fn genesis_record(chain_id: &str) -> ApprovalRecord {
        ApprovalRecord {
            id: Uuid::new_v4(),
            chain_id: chain_id.to_string(),
            sequence_num: 0,
            prev_record_id: None,
            prev_hash: None,
            record_hash: "deadbeef".to_string(),
            action: rsched_domain::ApprovalAction::Genesis,
            payload: serde_json::json!({}),
            actor_id: None,
            actor_type: rsched_domain::ActorType::System,
            reason: None,
            target_entity_type: None,
            target_entity_id: None,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn append_approval_rejects_duplicate_sequence() {
        let repo = InMemoryRepository::empty();
        let genesis = genesis_record("C1");
        repo.append_approval(genesis.clone()).unwrap();
        let result = repo.append_approval(genesis);
        assert!(matches!(result, Err(RepositoryError::Conflict(_))));
    }
}
