//! Entity metadata driving filter and order compilation.
//!
//! One [`EntitySchema`] per entity replaces the per-entity `*WhereInput` and
//! `*OrderByInput` types of a generated GraphQL layer: the compilers only need
//! to know each field's name, type, nullability and uniqueness, plus the
//! one-to-many relations an entity exposes.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::error::CompileError;
use crate::types::value::{ScalarKind, Value};

/// A closed set of enum literals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumDef {
    pub name: String,
    pub values: Vec<String>,
}

impl EnumDef {
    pub fn new<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, literal: &str) -> bool {
        self.values.iter().any(|v| v == literal)
    }
}

/// Declared type of a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FieldType {
    Scalar(ScalarKind),
    Enum(EnumDef),
    /// Array of scalars.
    List(ScalarKind),
}

impl FieldType {
    pub const STRING: FieldType = FieldType::Scalar(ScalarKind::String);
    pub const INT: FieldType = FieldType::Scalar(ScalarKind::Int);
    pub const FLOAT: FieldType = FieldType::Scalar(ScalarKind::Float);
    pub const BIG_INT: FieldType = FieldType::Scalar(ScalarKind::BigInt);
    pub const BIG_DECIMAL: FieldType = FieldType::Scalar(ScalarKind::BigDecimal);
    pub const BOOLEAN: FieldType = FieldType::Scalar(ScalarKind::Boolean);

    /// Lists have no natural order and cannot be sort keys.
    pub fn is_orderable(&self) -> bool {
        !matches!(self, FieldType::List(_))
    }

    /// Whether a non-null value has the shape of this type.
    pub fn admits(&self, value: &Value) -> bool {
        match (self, value) {
            (FieldType::Scalar(kind), value) => value.scalar_kind() == Some(*kind),
            (FieldType::Enum(def), Value::Enum(literal)) => def.contains(literal),
            (FieldType::List(kind), Value::List(items)) => {
                items.iter().all(|item| item.scalar_kind() == Some(*kind))
            }
            _ => false,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Scalar(kind) => write!(f, "{kind}"),
            FieldType::Enum(def) => f.write_str(&def.name),
            FieldType::List(kind) => write!(f, "[{kind}]"),
        }
    }
}

/// A single field of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDef {
    pub name: String,
    pub ty: FieldType,
    pub nullable: bool,
    /// Values are distinct across all rows of the entity.
    pub unique: bool,
}

/// One-to-many relation: rows of `target` whose `foreign_key` equals the owner's id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationDef {
    pub name: String,
    pub target: String,
    pub foreign_key: String,
}

/// Metadata for one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntitySchema {
    name: String,
    fields: Vec<FieldDef>,
    relations: Vec<RelationDef>,
}

impl EntitySchema {
    /// Name of the primary key field every entity carries.
    pub const ID_FIELD: &'static str = "id";

    /// Create an entity with only its `id` field.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: vec![FieldDef {
                name: Self::ID_FIELD.to_string(),
                ty: FieldType::STRING,
                nullable: false,
                unique: true,
            }],
            relations: Vec::new(),
        }
    }

    /// Add a non-null field.
    pub fn field(self, name: impl Into<String>, ty: FieldType) -> Self {
        self.push_field(name.into(), ty, false, false)
    }

    /// Add a nullable field.
    pub fn nullable(self, name: impl Into<String>, ty: FieldType) -> Self {
        self.push_field(name.into(), ty, true, false)
    }

    /// Add a non-null field whose values are distinct across rows.
    pub fn unique(self, name: impl Into<String>, ty: FieldType) -> Self {
        self.push_field(name.into(), ty, false, true)
    }

    /// Add a one-to-many relation.
    pub fn relation(
        mut self,
        name: impl Into<String>,
        target: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        self.relations.push(RelationDef {
            name: name.into(),
            target: target.into(),
            foreign_key: foreign_key.into(),
        });
        self
    }

    fn push_field(mut self, name: String, ty: FieldType, nullable: bool, unique: bool) -> Self {
        self.fields.retain(|f| f.name != name);
        self.fields.push(FieldDef {
            name,
            ty,
            nullable,
            unique,
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn relations(&self) -> &[RelationDef] {
        &self.relations
    }

    pub fn get_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn get_relation(&self, name: &str) -> Option<&RelationDef> {
        self.relations.iter().find(|r| r.name == name)
    }

    /// Look up a field, failing with [`CompileError::UnknownField`].
    pub fn require_field(&self, name: &str) -> Result<&FieldDef, CompileError> {
        self.get_field(name).ok_or_else(|| CompileError::UnknownField {
            entity: self.name.clone(),
            field: name.to_string(),
        })
    }

    /// Look up a relation, failing with [`CompileError::UnknownRelation`].
    pub fn require_relation(&self, name: &str) -> Result<&RelationDef, CompileError> {
        self.get_relation(name)
            .ok_or_else(|| CompileError::UnknownRelation {
                entity: self.name.clone(),
                relation: name.to_string(),
            })
    }
}

/// The set of entities a store serves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    entities: BTreeMap<String, EntitySchema>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity, replacing any previous entity with the same name.
    pub fn with_entity(mut self, entity: EntitySchema) -> Self {
        self.entities.insert(entity.name.clone(), entity);
        self
    }

    pub fn entity(&self, name: &str) -> Result<&EntitySchema, CompileError> {
        self.entities
            .get(name)
            .ok_or_else(|| CompileError::UnknownEntity(name.to_string()))
    }

    pub fn entities(&self) -> impl Iterator<Item = &EntitySchema> {
        self.entities.values()
    }

    /// Check that every relation points at an existing entity and a string
    /// foreign key on it.
    pub fn validate(&self) -> Result<(), CompileError> {
        for entity in self.entities.values() {
            for relation in &entity.relations {
                let target = self.entity(&relation.target)?;
                let fk = target.require_field(&relation.foreign_key)?;
                if fk.ty != FieldType::STRING {
                    return Err(CompileError::UnsupportedOperator {
                        field: fk.name.clone(),
                        operator: "relation".to_string(),
                        kind: fk.ty.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}
