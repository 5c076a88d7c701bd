//! Entity rows.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use serde_json::Value as Json;

use crate::error::{QueryError, Result};
use crate::types::scalars::value_from_json;
use crate::types::schema::EntitySchema;
use crate::types::value::{Value, NULL};

/// Anything the engine can filter, order and paginate: an id plus field access.
pub trait Entity {
    /// Primary key. Must be unique and immutable.
    fn id(&self) -> &str;

    /// Field value, `None` when the row does not carry the field.
    fn get(&self, field: &str) -> Option<&Value>;

    /// Field value with absent fields read as null.
    fn value(&self, field: &str) -> &Value {
        self.get(field).unwrap_or(&NULL)
    }
}

/// A schema-less entity row: an id and a map of field values.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    id: String,
    fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let mut fields = BTreeMap::new();
        fields.insert(
            EntitySchema::ID_FIELD.to_string(),
            Value::String(id.clone()),
        );
        Self { id, fields }
    }

    /// Builder-style field setter.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    /// Set a field. The id cannot be changed through this method.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        let field = field.into();
        if field != EntitySchema::ID_FIELD {
            self.fields.insert(field, value.into());
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Read a row from a JSON object, checking every field against the entity.
    ///
    /// Missing nullable fields become null; unknown fields, missing non-null
    /// fields and type mismatches are rejected.
    pub fn from_json(entity: &EntitySchema, json: &Json) -> Result<Self> {
        let object = json.as_object().ok_or_else(|| {
            QueryError::Parse(format!("{} row must be a JSON object", entity.name()))
        })?;

        let id = object
            .get(EntitySchema::ID_FIELD)
            .and_then(Json::as_str)
            .ok_or_else(|| {
                QueryError::Parse(format!("{} row is missing a string id", entity.name()))
            })?;

        if let Some(unknown) = object.keys().find(|k| entity.get_field(k).is_none()) {
            return Err(QueryError::Parse(format!(
                "Unknown field '{}' on {} row {}",
                unknown,
                entity.name(),
                id
            )));
        }

        let mut record = Record::new(id);
        for field in entity.fields() {
            if field.name == EntitySchema::ID_FIELD {
                continue;
            }
            let raw = object.get(&field.name).unwrap_or(&Json::Null);
            let value = value_from_json(&field.ty, raw).map_err(|e| {
                QueryError::Parse(format!(
                    "{}.{} on row {}: {}",
                    entity.name(),
                    field.name,
                    id,
                    e
                ))
            })?;
            if value.is_null() && !field.nullable {
                return Err(QueryError::Parse(format!(
                    "{}.{} on row {} must not be null",
                    entity.name(),
                    field.name,
                    id
                )));
            }
            record.set(field.name.clone(), value);
        }
        Ok(record)
    }

    /// Plain JSON object with every field.
    pub fn to_json(&self) -> Json {
        Json::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }

    /// Convert into a typed DTO through its JSON form.
    pub fn deserialize_into<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.to_json()).map_err(|e| {
            QueryError::Parse(format!("Failed to convert row {}: {}", self.id, e))
        })
    }
}

impl Entity for Record {
    fn id(&self) -> &str {
        &self.id
    }

    fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}
