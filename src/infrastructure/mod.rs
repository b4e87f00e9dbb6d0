mod account_repo;
mod catalog_repo;
pub mod memory;
pub mod models;
mod order_repo;

use crate::db::DbPool;
use crate::domain::errors::DomainError;

pub use memory::InMemoryStore;

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<diesel::result::Error> for DomainError {
    fn from(e: diesel::result::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

/// PostgreSQL-backed implementation of every repository port.
#[derive(Clone)]
pub struct DieselStore {
    pool: DbPool,
}

impl DieselStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}
