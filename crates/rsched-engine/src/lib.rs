//! Hybrid Layer Engine, CP-SAT-style solver adapter, and constraint
//! pruner for the residency scheduling core (spec.md §4.2, §4.3, §4.8).
//!
//! - `pruner`: eliminates infeasible `(person, block, rotation)` triples
//!   before a single decision variable is allocated.
//! - `variables`: turns the pruner's surviving triples into the solver's
//!   decision-variable pool.
//! - `hybrid`: L1 protected-pattern pre-commit and L2 structural
//!   requirement bounds.
//! - `solver`: the `SolverBackend` capability surface and the shipped
//!   `GreedySolverBackend`.
//! - `generate`: wires the above into one `run_generation` entry point,
//!   the Rust rendering of `generate_schedule`'s inner engine call (the
//!   lock/cache/audit wiring around it lives in `rsched-core`).

pub mod error;
pub mod generate;
pub mod hybrid;
pub mod pruner;
pub mod solver;
pub mod variables;

pub use error::{EngineError, Result};
pub use generate::{run_generation, GenerationOutcome, GenerationRequest};
pub use hybrid::{
    apply_protected_patterns, build_structural_requirements, inject_structural_requirements,
    locked_cell_keys, locked_cells_as_assignments, LockedCell, RotationAssignment,
    StructuralRequirement,
};
pub use pruner::{ConstraintPruner, PruningReason, PruningReport, PruningResult};
pub use solver::{GreedySolverBackend, SolveOutcome, SolverControl, SolverProgress};
pub use variables::VariablePool;
