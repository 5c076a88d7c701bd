//! Test helper utilities for query crate integration tests.

use std::time::Duration;

use async_trait::async_trait;
use perps_query::{
    perps, BackendError, CompiledFilter, ConnectionArgs, Entity, EntitySchema, EntityStore,
    FetchPlan, FieldType, InMemoryStore, QueryEngine, Record, Schema, Value,
};
use serde_json::Value as Json;

/// Load a fixture file as JSON.
pub fn load_fixture(name: &str) -> Json {
    let path = format!(
        "{}/tests/fixtures/{}.json",
        env!("CARGO_MANIFEST_DIR"),
        name
    );
    let raw = std::fs::read_to_string(&path)
        .unwrap_or_else(|_| panic!("Failed to load fixture: {}", path));
    serde_json::from_str(&raw).unwrap_or_else(|e| panic!("Invalid fixture {}: {}", path, e))
}

/// Engine over the perps schema loaded with the `perps` fixture.
pub fn perps_engine() -> QueryEngine<InMemoryStore> {
    let schema = perps::schema();
    let store = InMemoryStore::from_json_dataset(&schema, &load_fixture("perps")).unwrap();
    QueryEngine::new(schema, store)
}

/// Single-entity schema with a nullable BigInt `size` and a string `account`.
pub fn sized_schema() -> Schema {
    Schema::new().with_entity(
        EntitySchema::new("Position")
            .field("account", FieldType::STRING)
            .nullable("size", FieldType::BIG_INT),
    )
}

/// Position row with an optional size.
pub fn sized(id: &str, size: Option<i64>) -> Record {
    Record::new(id)
        .with("account", "0xabc")
        .with("size", size.map(|s| Value::BigInt(s.into())))
}

pub fn ids<'a>(rows: impl IntoIterator<Item = &'a Record>) -> Vec<String> {
    rows.into_iter().map(|r| r.id().to_string()).collect()
}

/// Walk `endCursor`s from the first page to exhaustion, returning ids in order.
pub async fn collect_pages<S: EntityStore>(
    engine: &QueryEngine<S>,
    entity: &str,
    args: ConnectionArgs,
) -> Vec<String> {
    let mut args = args;
    let mut seen = Vec::new();
    loop {
        let page = engine.paginate(entity, &args).await.unwrap();
        assert!(page.edges.len() <= usize::try_from(args.first).unwrap());
        seen.extend(page.edges.iter().map(|e| e.node.id().to_string()));
        if !page.page_info.has_next_page {
            return seen;
        }
        args = args.after_opt(page.page_info.end_cursor);
    }
}

/// Store whose every call fails with a fixed error.
pub struct FailingStore {
    pub unavailable: bool,
}

#[derive(Debug, thiserror::Error)]
#[error("connection reset by peer")]
pub struct ConnectionReset;

#[async_trait]
impl EntityStore for FailingStore {
    async fn fetch(&self, _plan: &FetchPlan) -> Result<Vec<Record>, BackendError> {
        Err(self.error())
    }

    async fn count(&self, _entity: &str, _filter: &CompiledFilter) -> Result<u64, BackendError> {
        Err(self.error())
    }
}

impl FailingStore {
    fn error(&self) -> BackendError {
        if self.unavailable {
            BackendError::Unavailable("replica lagging".to_string())
        } else {
            BackendError::other("fetch failed", ConnectionReset)
        }
    }
}

/// Store that delays every call before delegating.
pub struct SlowStore {
    pub inner: InMemoryStore,
    pub delay: Duration,
}

#[async_trait]
impl EntityStore for SlowStore {
    async fn fetch(&self, plan: &FetchPlan) -> Result<Vec<Record>, BackendError> {
        tokio::time::sleep(self.delay).await;
        self.inner.fetch(plan).await
    }

    async fn count(&self, entity: &str, filter: &CompiledFilter) -> Result<u64, BackendError> {
        tokio::time::sleep(self.delay).await;
        self.inner.count(entity, filter).await
    }
}
