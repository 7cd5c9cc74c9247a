//! Solution cache for schedule generation (spec.md §4.7): caches complete
//! and partial solutions keyed by a hash of the problem definition so a
//! re-run over unchanged inputs can skip the solver entirely.
//!
//! Confirmed against the original `SolutionCache`: key prefixes
//! `schedule_solution:` and `partial_solution:`, a default 3600s TTL, and
//! an `invalidate_solutions` sweep over both prefixes. The original's
//! `get_similar_solutions` is a documented placeholder (`return []`) with
//! no behavior to preserve and is not carried forward.

pub mod backend;
pub mod error;
pub mod in_memory;
#[cfg(feature = "redis")]
pub mod redis_backend;

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

pub use backend::CacheBackend;
pub use error::{CacheError, Result};
pub use in_memory::InMemoryCacheBackend;
#[cfg(feature = "redis")]
pub use redis_backend::RedisCacheBackend;

use rsched_foundation::canonical_hash;

pub const DEFAULT_TTL_SECONDS: u64 = 3600;
const SCHEDULE_SOLUTION_PREFIX: &str = "schedule_solution:";
const PARTIAL_SOLUTION_PREFIX: &str = "partial_solution:";

/// Inputs that determine whether two scheduling runs are "the same
/// problem". Constraint parameters are passed as an already-serializable
/// value (typically the solver config) rather than re-deriving it here.
#[derive(Debug, Clone)]
pub struct ProblemDefinition<'a> {
    pub person_ids: &'a [Uuid],
    pub rotation_ids: &'a [Uuid],
    pub block_ids: &'a [Uuid],
    pub constraints: &'a Value,
}

#[derive(Serialize)]
struct ProblemHashInput {
    persons: Vec<Uuid>,
    rotations: Vec<Uuid>,
    blocks: Vec<Uuid>,
    constraints: Value,
}

/// Hashes a problem definition to a 16-hex-character key, matching the
/// original's `sha256(...).hexdigest()[:16]` truncation.
pub fn generate_problem_hash(problem: &ProblemDefinition<'_>) -> Result<String> {
    let mut persons = problem.person_ids.to_vec();
    persons.sort();
    let mut rotations = problem.rotation_ids.to_vec();
    rotations.sort();
    let mut blocks = problem.block_ids.to_vec();
    blocks.sort();

    let input = ProblemHashInput {
        persons,
        rotations,
        blocks,
        constraints: problem.constraints.clone(),
    };
    let full = canonical_hash(&input)?;
    Ok(full[..16].to_string())
}

fn partial_key(problem_hash: &str, start: NaiveDate, end: NaiveDate) -> String {
    format!("{PARTIAL_SOLUTION_PREFIX}{problem_hash}:{start}:{end}")
}

fn solution_key(problem_hash: &str) -> String {
    format!("{SCHEDULE_SOLUTION_PREFIX}{problem_hash}")
}

/// Caches solver output keyed by problem hash, with a pluggable
/// [`CacheBackend`].
pub struct SolutionCache {
    backend: Arc<dyn CacheBackend>,
    ttl: Duration,
}

impl SolutionCache {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            backend,
            ttl: Duration::from_secs(DEFAULT_TTL_SECONDS),
        }
    }

    pub fn with_ttl(backend: Arc<dyn CacheBackend>, ttl: Duration) -> Self {
        Self { backend, ttl }
    }

    pub fn get_solution<T: for<'de> Deserialize<'de>>(&self, problem_hash: &str) -> Result<Option<T>> {
        let key = solution_key(problem_hash);
        match self.backend.get(&key)? {
            Some(raw) => {
                info!(problem_hash, "solution cache hit");
                Ok(Some(serde_json::from_str(&raw).map_err(rsched_foundation::FoundationError::from)?))
            }
            None => {
                debug!(problem_hash, "solution cache miss");
                Ok(None)
            }
        }
    }

    pub fn set_solution<T: Serialize>(&self, problem_hash: &str, solution: &T, ttl: Option<Duration>) -> Result<()> {
        let key = solution_key(problem_hash);
        let raw = serde_json::to_string(solution).map_err(rsched_foundation::FoundationError::from)?;
        self.backend.set(&key, raw, ttl.unwrap_or(self.ttl))?;
        info!(problem_hash, "cached solution");
        Ok(())
    }

    pub fn get_partial_solution<T: for<'de> Deserialize<'de>>(
        &self,
        problem_hash: &str,
        date_range: (NaiveDate, NaiveDate),
    ) -> Result<Option<T>> {
        let key = partial_key(problem_hash, date_range.0, date_range.1);
        match self.backend.get(&key)? {
            Some(raw) => {
                info!(problem_hash, "partial solution cache hit");
                Ok(Some(serde_json::from_str(&raw).map_err(rsched_foundation::FoundationError::from)?))
            }
            None => Ok(None),
        }
    }

    pub fn set_partial_solution<T: Serialize>(
        &self,
        problem_hash: &str,
        date_range: (NaiveDate, NaiveDate),
        partial_solution: &T,
        ttl: Option<Duration>,
    ) -> Result<()> {
        let key = partial_key(problem_hash, date_range.0, date_range.1);
        let raw = serde_json::to_string(partial_solution).map_err(rsched_foundation::FoundationError::from)?;
        self.backend.set(&key, raw, ttl.unwrap_or(self.ttl))?;
        Ok(())
    }

    /// Clears every cached solution and partial solution. The original
    /// always invalidates everything rather than selectively by
    /// person/rotation/date range; that coarse behavior is preserved here.
    pub fn invalidate_solutions(&self) -> Result<usize> {
        let mut count = self.backend.invalidate_prefix(SCHEDULE_SOLUTION_PREFIX)?;
        count += self.backend.invalidate_prefix(PARTIAL_SOLUTION_PREFIX)?;
        info!(count, "invalidated solution cache entries");
        Ok(count)
    }
}

/// Assignment-shaped payload the incremental builder accumulates. Solver
/// code supplies its own richer assignment type; this wrapper only needs
/// enough structure to append and serialize.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct IncrementalSolution {
    pub assignments: Vec<Value>,
}

/// Builds a solution incrementally, caching each date range's partial
/// result as it is produced and the full solution once finalized.
pub struct IncrementalSolutionBuilder {
    cache: Arc<SolutionCache>,
    current: IncrementalSolution,
    problem_hash: Option<String>,
}

impl IncrementalSolutionBuilder {
    pub fn new(cache: Arc<SolutionCache>) -> Self {
        Self {
            cache,
            current: IncrementalSolution::default(),
            problem_hash: None,
        }
    }

    /// Seeds `current` from a cached solution for `problem`, if one exists.
    pub fn initialize(&mut self, problem: &ProblemDefinition<'_>) -> Result<()> {
        let hash = generate_problem_hash(problem)?;
        if let Some(cached) = self.cache.get_solution::<IncrementalSolution>(&hash)? {
            self.current = cached;
            info!("loaded cached solution");
        } else {
            self.current = IncrementalSolution::default();
        }
        self.problem_hash = Some(hash);
        Ok(())
    }

    pub fn add_assignments(&mut self, assignments: Vec<Value>, date_range: (NaiveDate, NaiveDate)) -> Result<()> {
        self.current.assignments.extend(assignments.iter().cloned());
        if let Some(hash) = &self.problem_hash {
            let partial = IncrementalSolution { assignments };
            self.cache.set_partial_solution(hash, date_range, &partial, None)?;
        }
        Ok(())
    }

    pub fn finalize(&self) -> Result<&IncrementalSolution> {
        if let Some(hash) = &self.problem_hash {
            self.cache.set_solution(hash, &self.current, None)?;
        }
        info!("finalized and cached complete solution");
        Ok(&self.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cache() -> SolutionCache {
        SolutionCache::new(Arc::new(InMemoryCacheBackend::new(64)))
    }

    fn sample_problem<'a>(persons: &'a [Uuid], rotations: &'a [Uuid], blocks: &'a [Uuid], constraints: &'a Value) -> ProblemDefinition<'a> {
        ProblemDefinition {
            person_ids: persons,
            rotation_ids: rotations,
            block_ids: blocks,
            constraints,
        }
    }

    #[test]
    fn problem_hash_is_stable_under_id_reordering() {
        let a = [Uuid::nil(), Uuid::max()];
        let b = [Uuid::max(), Uuid::nil()];
        let constraints = json!({"max_hours": 80});
        let h1 = generate_problem_hash(&sample_problem(&a, &[], &[], &constraints)).unwrap();
        let h2 = generate_problem_hash(&sample_problem(&b, &[], &[], &constraints)).unwrap();
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 16);
    }

    #[test]
    fn problem_hash_changes_with_constraints() {
        let persons = [Uuid::nil()];
        let h1 = generate_problem_hash(&sample_problem(&persons, &[], &[], &json!({"max_hours": 80}))).unwrap();
        let h2 = generate_problem_hash(&sample_problem(&persons, &[], &[], &json!({"max_hours": 70}))).unwrap();
        assert_ne!(h1, h2);
    }

    #[test]
    fn set_then_get_solution_round_trips() {
        let cache = cache();
        let solution = json!({"assignments": [1, 2, 3]});
        cache.set_solution("abc123", &solution, None).unwrap();
        let fetched: Value = cache.get_solution("abc123").unwrap().unwrap();
        assert_eq!(fetched, solution);
    }

    #[test]
    fn invalidate_solutions_clears_both_prefixes() {
        let cache = cache();
        cache.set_solution("abc", &json!({}), None).unwrap();
        cache
            .set_partial_solution("abc", (NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), NaiveDate::from_ymd_opt(2024, 1, 7).unwrap()), &json!({}), None)
            .unwrap();
        let removed = cache.invalidate_solutions().unwrap();
        assert_eq!(removed, 2);
        assert!(cache.get_solution::<Value>("abc").unwrap().is_none());
    }

    #[test]
    fn incremental_builder_finalizes_from_added_assignments() {
        let cache = Arc::new(cache());
        let mut builder = IncrementalSolutionBuilder::new(Arc::clone(&cache));
        let persons = [Uuid::nil()];
        let constraints = json!({});
        builder.initialize(&sample_problem(&persons, &[], &[], &constraints)).unwrap();
        builder
            .add_assignments(vec![json!({"person": "a"})], (NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), NaiveDate::from_ymd_opt(2024, 1, 7).unwrap()))
            .unwrap();
        let finalized = builder.finalize().unwrap();
        assert_eq!(finalized.assignments.len(), 1);
    }
}
