//! Storage backends.
//!
//! The engine hands a backend a [`FetchPlan`]: the compiled filter (already
//! including the resume point), the compiled order and the row window. A
//! backend either evaluates the plan itself, like [`InMemoryStore`], or pushes
//! it down with [`FetchPlan::to_sql`].

mod memory;

pub use memory::InMemoryStore;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::BackendError;
use crate::filters::CompiledFilter;
use crate::order::CompiledOrder;
use crate::types::record::Record;

/// A single bounded read against one entity collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchPlan {
    pub entity: String,
    pub filter: CompiledFilter,
    pub order: CompiledOrder,
    /// Maximum rows to return; `None` returns every matching row.
    pub limit: Option<usize>,
    /// Matching rows to skip before the first returned row.
    pub offset: usize,
}

/// Backend that executes fetch plans.
///
/// Implementations must return rows in `plan.order` and apply `offset` and
/// `limit` after filtering and ordering. Errors are returned verbatim to the
/// caller; the engine never retries.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Rows matching the plan, ordered and windowed.
    async fn fetch(&self, plan: &FetchPlan) -> Result<Vec<Record>, BackendError>;

    /// Number of rows of `entity` matching `filter`.
    async fn count(&self, entity: &str, filter: &CompiledFilter) -> Result<u64, BackendError>;
}
