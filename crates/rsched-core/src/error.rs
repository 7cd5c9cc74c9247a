//! `CoreError`: aggregates every sub-crate's error type the way
//! `rh-validator::ValidatorError` aggregates `rh_codegen::CodegenError`
//! and `rh_loader::LoaderError` (spec.md §7, SPEC_FULL.md §7).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Engine(#[from] rsched_engine::EngineError),

    #[error(transparent)]
    Audit(#[from] rsched_audit::AuditError),

    #[error(transparent)]
    Lock(#[from] rsched_lock::LockError),

    #[error(transparent)]
    Cache(#[from] rsched_cache::CacheError),

    #[error(transparent)]
    Repository(#[from] rsched_repository::RepositoryError),

    #[error(transparent)]
    Domain(#[from] rsched_domain::DomainError),

    #[error(transparent)]
    Foundation(#[from] rsched_foundation::FoundationError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
