//! `VariablePool`: turns the pruner's surviving `(person, block, template)`
//! triples into solver decision variables and implements
//! `rsched_constraints::DecisionVars` over them.

use std::collections::HashMap;

use uuid::Uuid;

use rsched_constraints::{DecisionVars, VarId};

pub struct VariablePool {
    by_triple: HashMap<(Uuid, Uuid, Uuid), VarId>,
    by_block: HashMap<Uuid, Vec<VarId>>,
    by_person: HashMap<Uuid, Vec<VarId>>,
    by_person_template: HashMap<(Uuid, Uuid), Vec<VarId>>,
    /// Variables sharing a `(person, block)` pair — the candidates among
    /// which a single person picks at most one rotation template for a
    /// given half-day. Distinct from `by_block`, which spans every person
    /// touching that block and must never be used for an occupancy
    /// clause (that would wrongly cap an entire block to one person).
    by_person_block: HashMap<(Uuid, Uuid), Vec<VarId>>,
    /// `(person, block, template)` for each `VarId`, in allocation order —
    /// the inverse of `by_triple`, used to translate solved values back
    /// into `Assignment` records.
    triples: Vec<(Uuid, Uuid, Uuid)>,
}

impl VariablePool {
    /// Allocates one variable per `triple` via `alloc` (typically
    /// `SolverBackend::new_var`), in the given order.
    pub fn build(triples: &[(Uuid, Uuid, Uuid)], mut alloc: impl FnMut() -> VarId) -> Self {
        let mut by_triple = HashMap::with_capacity(triples.len());
        let mut by_block: HashMap<Uuid, Vec<VarId>> = HashMap::new();
        let mut by_person: HashMap<Uuid, Vec<VarId>> = HashMap::new();
        let mut by_person_template: HashMap<(Uuid, Uuid), Vec<VarId>> = HashMap::new();
        let mut by_person_block: HashMap<(Uuid, Uuid), Vec<VarId>> = HashMap::new();
        let mut ordered_triples = Vec::with_capacity(triples.len());

        for &(person, block, template) in triples {
            let var = alloc();
            by_triple.insert((person, block, template), var);
            by_block.entry(block).or_default().push(var);
            by_person.entry(person).or_default().push(var);
            by_person_template.entry((person, template)).or_default().push(var);
            by_person_block.entry((person, block)).or_default().push(var);
            ordered_triples.push((person, block, template));
        }

        Self {
            by_triple,
            by_block,
            by_person,
            by_person_template,
            by_person_block,
            triples: ordered_triples,
        }
    }

    /// Variable groups for the per-block occupancy clause (spec.md §4.3:
    /// "a person occupies at most one slot per block"): one group per
    /// `(person, block)` pair that has more than one candidate template.
    pub fn person_block_groups(&self) -> impl Iterator<Item = &Vec<VarId>> {
        self.by_person_block.values()
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// `(person, block, template)` for `var`, if it was allocated by this
    /// pool.
    pub fn triple_for(&self, var: VarId) -> Option<(Uuid, Uuid, Uuid)> {
        self.triples.get(var).copied()
    }

    pub fn all_vars(&self) -> impl Iterator<Item = VarId> + '_ {
        0..self.triples.len()
    }
}

impl DecisionVars for VariablePool {
    fn var(&self, person: Uuid, block: Uuid, template: Uuid) -> Option<VarId> {
        self.by_triple.get(&(person, block, template)).copied()
    }

    fn vars_for_block(&self, block: Uuid) -> Vec<VarId> {
        self.by_block.get(&block).cloned().unwrap_or_default()
    }

    fn vars_for_person(&self, person: Uuid) -> Vec<VarId> {
        self.by_person.get(&person).cloned().unwrap_or_default()
    }

    fn vars_for_person_template(&self, person: Uuid, template: Uuid) -> Vec<VarId> {
        self.by_person_template
            .get(&(person, template))
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_resolve_allocated_variables() {
        let p1 = Uuid::new_v4();
        let b1 = Uuid::new_v4();
        let t1 = Uuid::new_v4();
        let triples = vec![(p1, b1, t1)];
        let mut next = 0usize;
        let pool = VariablePool::build(&triples, || {
            let v = next;
            next += 1;
            v
        });
        assert_eq!(pool.var(p1, b1, t1), Some(0));
        assert_eq!(pool.vars_for_block(b1), vec![0]);
        assert_eq!(pool.vars_for_person(p1), vec![0]);
        assert_eq!(pool.vars_for_person_template(p1, t1), vec![0]);
        assert_eq!(pool.triple_for(0), Some((p1, b1, t1)));
        assert_eq!(pool.var(Uuid::new_v4(), b1, t1), None);
    }

    #[test]
    fn person_block_groups_never_span_distinct_persons() {
        let p1 = Uuid::new_v4();
        let p2 = Uuid::new_v4();
        let b1 = Uuid::new_v4();
        let t1 = Uuid::new_v4();
        let t2 = Uuid::new_v4();
        // Two persons each with two candidate templates for the same block.
        let triples = vec![(p1, b1, t1), (p1, b1, t2), (p2, b1, t1), (p2, b1, t2)];
        let mut next = 0usize;
        let pool = VariablePool::build(&triples, || {
            let v = next;
            next += 1;
            v
        });
        let groups: Vec<Vec<VarId>> = pool.person_block_groups().cloned().collect();
        assert_eq!(groups.len(), 2);
        for group in &groups {
            assert_eq!(group.len(), 2);
        }
        // vars_for_block still spans both persons — used by constraints
        // that need whole-block visibility (e.g. supervision ratio).
        assert_eq!(pool.vars_for_block(b1).len(), 4);
    }
}
