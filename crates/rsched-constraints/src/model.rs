//! The solver-agnostic surface a constraint writes clauses into.
//!
//! Constraints never touch solver internals (spec.md §4.3 keeps the
//! constraint library usable by more than one backend). Instead a
//! constraint calls `ModelSink::add_clause` with a symbolic `Clause`; the
//! solver backend in `rsched-engine` is the only place that interprets
//! these against its actual decision-variable representation.

use uuid::Uuid;

/// Opaque handle into the solver's decision-variable pool.
pub type VarId = usize;

/// A symbolic contribution to the model. `rsched-engine::solver`
/// interprets these; weights on `SoftPenalty` are already
/// `weight * priority`-scaled by the constraint that emits them.
#[derive(Debug, Clone)]
pub enum Clause {
    /// At most one of these variables may be true (occupancy per block).
    AtMostOne(Vec<VarId>),
    /// Exactly `n` of these variables must be true.
    ExactlyN(Vec<VarId>, u32),
    /// The count of true variables among `vars` must lie in `[min, max]`.
    CountInRange {
        vars: Vec<VarId>,
        min: u32,
        max: u32,
    },
    /// `antecedent ⇒ Σ consequents ≥ 1`.
    Implication {
        antecedent: VarId,
        consequents: Vec<VarId>,
    },
    /// This variable is forced false (e.g. an absent person on a block).
    Forbid(VarId),
    /// A soft penalty contribution: `weight` added to the objective for
    /// every one of `vars` that ends up true.
    SoftPenalty { vars: Vec<VarId>, weight: f64 },
}

/// Receives clauses during constraint injection.
pub trait ModelSink {
    fn add_clause(&mut self, clause: Clause, source: &str);
}

/// Lookup surface over the solver's decision variables, indexed by the
/// domain ids they represent. `rsched-engine` builds the concrete
/// implementation once per run and hands it to every constraint.
pub trait DecisionVars {
    /// The variable for `(person, block, template)`, if that triple was
    /// not pruned (spec.md §4.8) and is not already pre-committed by
    /// Layer 1.
    fn var(&self, person: Uuid, block: Uuid, template: Uuid) -> Option<VarId>;

    /// All free (non-pre-committed) variables touching `block`.
    fn vars_for_block(&self, block: Uuid) -> Vec<VarId>;

    /// All free variables touching `person`.
    fn vars_for_person(&self, person: Uuid) -> Vec<VarId>;

    /// All free variables for `(person, template)` across every block.
    fn vars_for_person_template(&self, person: Uuid, template: Uuid) -> Vec<VarId>;
}
