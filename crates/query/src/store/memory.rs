use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value as Json;
use tokio::sync::RwLock;
use tracing::debug;

use super::{EntityStore, FetchPlan};
use crate::error::{BackendError, QueryError, Result};
use crate::filters::CompiledFilter;
use crate::types::record::{Entity, Record};
use crate::types::schema::{EntitySchema, Schema};

/// Store that keeps every collection in memory and evaluates plans directly.
///
/// Ids are unique per entity. Stores built from a schema also reject rows
/// that repeat a non-null value of a field declared `unique`.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    collections: RwLock<HashMap<String, Vec<Record>>>,
    unique_fields: HashMap<String, Vec<String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty store enforcing the `unique` fields declared in `schema`.
    pub fn with_schema(schema: &Schema) -> Self {
        let unique_fields = schema
            .entities()
            .map(|entity| {
                let fields = entity
                    .fields()
                    .iter()
                    .filter(|f| f.unique && f.name != EntitySchema::ID_FIELD)
                    .map(|f| f.name.clone())
                    .collect();
                (entity.name().to_string(), fields)
            })
            .collect();
        Self {
            collections: RwLock::default(),
            unique_fields,
        }
    }

    /// Build a store from ready collections keyed by entity name.
    ///
    /// Only ids are assumed unique; no other constraint is checked.
    pub fn from_collections(collections: HashMap<String, Vec<Record>>) -> Self {
        Self {
            collections: RwLock::new(collections),
            unique_fields: HashMap::new(),
        }
    }

    /// Load a dataset shaped `{"Entity": [row, ...], ...}`, validating every row
    /// against `schema`.
    pub fn from_json_dataset(schema: &Schema, dataset: &Json) -> Result<Self> {
        let object = dataset
            .as_object()
            .ok_or_else(|| QueryError::Parse("dataset must be a JSON object".to_string()))?;

        let mut store = Self::with_schema(schema);
        let mut collections = HashMap::with_capacity(object.len());
        for (name, rows) in object {
            let entity = schema.entity(name)?;
            let rows = rows.as_array().ok_or_else(|| {
                QueryError::Parse(format!("dataset entry for {name} must be an array"))
            })?;

            let mut records: Vec<Record> = Vec::with_capacity(rows.len());
            for row in rows {
                let record = Record::from_json(entity, row)?;
                if records.iter().any(|r| r.id() == record.id()) {
                    return Err(QueryError::Parse(format!(
                        "duplicate id {} in {}",
                        record.id(),
                        name
                    )));
                }
                if let Some(conflict) = store.unique_conflict(name, &records, &record) {
                    return Err(QueryError::Parse(conflict));
                }
                records.push(record);
            }
            collections.insert(name.clone(), records);
        }
        *store.collections.get_mut() = collections;
        Ok(store)
    }

    /// Insert a row, replacing any row of the same entity with the same id.
    ///
    /// Fails with [`BackendError::Conflict`] when another row already holds the
    /// same value of a unique field.
    pub async fn insert(&self, entity: &str, record: Record) -> Result<()> {
        let mut collections = self.collections.write().await;
        let rows = collections.entry(entity.to_string()).or_default();
        if let Some(conflict) = self.unique_conflict(entity, rows, &record) {
            return Err(BackendError::Conflict(conflict).into());
        }
        match rows.iter_mut().find(|r| r.id() == record.id()) {
            Some(existing) => *existing = record,
            None => rows.push(record),
        }
        Ok(())
    }

    /// Insert many rows, stopping at the first conflict.
    pub async fn extend<I: IntoIterator<Item = Record>>(&self, entity: &str, records: I) -> Result<()> {
        for record in records {
            self.insert(entity, record).await?;
        }
        Ok(())
    }

    /// Remove a row by id, returning it if it existed.
    pub async fn remove(&self, entity: &str, id: &str) -> Option<Record> {
        let mut collections = self.collections.write().await;
        let rows = collections.get_mut(entity)?;
        let index = rows.iter().position(|r| r.id() == id)?;
        Some(rows.remove(index))
    }

    /// Number of stored rows of `entity`, ignoring filters.
    pub async fn len(&self, entity: &str) -> usize {
        self.collections
            .read()
            .await
            .get(entity)
            .map_or(0, Vec::len)
    }

    /// First unique field whose value `record` would duplicate.
    fn unique_conflict(&self, entity: &str, rows: &[Record], record: &Record) -> Option<String> {
        let fields = self.unique_fields.get(entity)?;
        fields.iter().find_map(|field| {
            let value = record.value(field);
            if value.is_null() {
                return None;
            }
            rows.iter()
                .find(|r| r.id() != record.id() && r.value(field).same_as(value))
                .map(|r| {
                    format!(
                        "{entity}.{field} value {value} is already used by {}",
                        r.id()
                    )
                })
        })
    }
}

#[async_trait]
impl EntityStore for InMemoryStore {
    async fn fetch(&self, plan: &FetchPlan) -> std::result::Result<Vec<Record>, BackendError> {
        let collections = self.collections.read().await;
        let Some(rows) = collections.get(&plan.entity) else {
            return Ok(Vec::new());
        };

        let mut matched: Vec<&Record> = rows
            .iter()
            .filter(|row| plan.filter.matches(*row, &*collections))
            .collect();
        matched.sort_by(|a, b| plan.order.compare(*a, *b));

        debug!(
            entity = %plan.entity,
            matched = matched.len(),
            offset = plan.offset,
            limit = ?plan.limit,
            "evaluated fetch plan in memory"
        );

        Ok(matched
            .into_iter()
            .skip(plan.offset)
            .take(plan.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn count(
        &self,
        entity: &str,
        filter: &CompiledFilter,
    ) -> std::result::Result<u64, BackendError> {
        let collections = self.collections.read().await;
        let count = collections.get(entity).map_or(0, |rows| {
            rows.iter()
                .filter(|row| filter.matches(*row, &*collections))
                .count()
        });
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{compile, Predicate};
    use crate::order::compile_order;
    use crate::types::ordering::OrderKey;
    use crate::types::schema::{EntitySchema, FieldType};
    use crate::types::value::Value;
    use serde_json::json;

    fn schema() -> Schema {
        Schema::new()
            .with_entity(
                EntitySchema::new("Position")
                    .nullable("size", FieldType::BIG_INT)
                    .relation("trades", "Trade", "position"),
            )
            .with_entity(EntitySchema::new("Trade").field("position", FieldType::STRING))
    }

    fn dataset() -> Json {
        json!({
            "Position": [
                {"id": "a", "size": "100"},
                {"id": "b", "size": "50"},
                {"id": "c", "size": null}
            ],
            "Trade": [
                {"id": "t1", "position": "a"}
            ]
        })
    }

    fn plan(filter: CompiledFilter, limit: Option<usize>, offset: usize) -> FetchPlan {
        let schema = schema();
        FetchPlan {
            entity: "Position".to_string(),
            filter,
            order: compile_order(schema.entity("Position").unwrap(), &[OrderKey::asc("size")])
                .unwrap(),
            limit,
            offset,
        }
    }

    fn ids(rows: &[Record]) -> Vec<&str> {
        rows.iter().map(|r| r.id()).collect()
    }

    #[tokio::test]
    async fn test_fetch_orders_and_windows() {
        let store = InMemoryStore::from_json_dataset(&schema(), &dataset()).unwrap();

        let rows = store.fetch(&plan(CompiledFilter::always(), None, 0)).await.unwrap();
        assert_eq!(ids(&rows), ["b", "a", "c"]);

        let rows = store.fetch(&plan(CompiledFilter::always(), Some(1), 1)).await.unwrap();
        assert_eq!(ids(&rows), ["a"]);
    }

    #[tokio::test]
    async fn test_relation_filters_see_other_collections() {
        let schema = schema();
        let store = InMemoryStore::from_json_dataset(&schema, &dataset()).unwrap();
        let filter = compile(&schema, "Position", &Predicate::some("trades", Predicate::always()))
            .unwrap();

        let rows = store.fetch(&plan(filter.clone(), None, 0)).await.unwrap();
        assert_eq!(ids(&rows), ["a"]);
        assert_eq!(store.count("Position", &filter).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_insert_replaces_by_id() {
        let store = InMemoryStore::new();
        store
            .insert("Position", Record::new("a").with("size", Value::Null))
            .await
            .unwrap();
        store
            .insert("Position", Record::new("a").with("size", Value::BigInt(1.into())))
            .await
            .unwrap();
        assert_eq!(store.len("Position").await, 1);
        assert!(store.remove("Position", "a").await.is_some());
        assert_eq!(store.len("Position").await, 0);
        assert!(store.remove("Position", "a").await.is_none());
    }

    #[tokio::test]
    async fn test_unknown_collection_is_empty() {
        let store = InMemoryStore::new();
        assert!(store.fetch(&plan(CompiledFilter::always(), None, 0)).await.unwrap().is_empty());
        assert_eq!(store.count("Position", &CompiledFilter::always()).await.unwrap(), 0);
    }

    fn market_schema() -> Schema {
        Schema::new().with_entity(
            EntitySchema::new("Market")
                .unique("marketToken", FieldType::STRING)
                .nullable("symbol", FieldType::STRING),
        )
    }

    #[test]
    fn test_dataset_rejects_duplicate_unique_values() {
        let err = InMemoryStore::from_json_dataset(
            &market_schema(),
            &json!({"Market": [
                {"id": "m1", "marketToken": "0xdup", "symbol": null},
                {"id": "m2", "marketToken": "0xdup", "symbol": null},
                {"id": "m3", "marketToken": "0xabc", "symbol": null}
            ]}),
        )
        .err()
        .unwrap();
        assert!(matches!(err, QueryError::Parse(ref msg) if msg.contains("Market.marketToken")));
    }

    #[tokio::test]
    async fn test_insert_enforces_unique_fields() {
        let store = InMemoryStore::with_schema(&market_schema());
        store
            .insert("Market", Record::new("m1").with("marketToken", "0xdup"))
            .await
            .unwrap();

        let err = store
            .insert("Market", Record::new("m2").with("marketToken", "0xdup"))
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::Backend(BackendError::Conflict(_))));
        assert_eq!(store.len("Market").await, 1);

        // Replacing a row may keep its own value; nulls never conflict.
        store
            .insert("Market", Record::new("m1").with("marketToken", "0xdup"))
            .await
            .unwrap();
        store
            .extend(
                "Market",
                [
                    Record::new("m2").with("marketToken", Value::Null),
                    Record::new("m3").with("marketToken", Value::Null),
                ],
            )
            .await
            .unwrap();
        assert_eq!(store.len("Market").await, 3);
    }

    #[test]
    fn test_dataset_validation() {
        let schema = schema();
        assert!(matches!(
            InMemoryStore::from_json_dataset(&schema, &json!({"Vault": []})),
            Err(QueryError::Compile(_))
        ));
        assert!(matches!(
            InMemoryStore::from_json_dataset(&schema, &json!({"Position": {}})),
            Err(QueryError::Parse(_))
        ));
        assert!(matches!(
            InMemoryStore::from_json_dataset(
                &schema,
                &json!({"Position": [{"id": "a"}, {"id": "a"}]})
            ),
            Err(QueryError::Parse(_))
        ));
    }
}
