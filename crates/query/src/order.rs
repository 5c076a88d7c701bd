//! Order compiler: turns `orderBy` keys into a deterministic comparator.
//!
//! Invariant: a compiled order is a total order over rows. Unless `id` is
//! already one of the keys, `id ASC` is appended as the final key. A field
//! declared `unique` is not trusted to break ties, since only `id` uniqueness
//! is guaranteed by every store.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::Serialize;

use crate::error::CompileError;
use crate::types::ordering::{OrderDirection, OrderKey};
use crate::types::record::Entity;
use crate::types::schema::{EntitySchema, FieldType};
use crate::types::value::Value;

/// One resolved sort key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortKey {
    pub field: String,
    pub ty: FieldType,
    pub direction: OrderDirection,
    pub nulls_first: bool,
    pub nullable: bool,
}

impl SortKey {
    fn compare(&self, a: &Value, b: &Value) -> Ordering {
        match (a.is_null(), b.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => {
                if self.nulls_first {
                    Ordering::Less
                } else {
                    Ordering::Greater
                }
            }
            (false, true) => {
                if self.nulls_first {
                    Ordering::Greater
                } else {
                    Ordering::Less
                }
            }
            (false, false) => {
                let ord = a.sort_cmp(b);
                match self.direction {
                    OrderDirection::Asc => ord,
                    OrderDirection::Desc => ord.reverse(),
                }
            }
        }
    }
}

/// Lexicographic comparator over resolved sort keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledOrder {
    keys: Vec<SortKey>,
    implicit_tiebreak: bool,
}

impl CompiledOrder {
    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    /// Whether `id ASC` was appended by the compiler.
    pub fn has_implicit_tiebreak(&self) -> bool {
        self.implicit_tiebreak
    }

    /// Values of every sort key for a row, in key order.
    pub fn tuple<E: Entity>(&self, row: &E) -> Vec<Value> {
        self.keys
            .iter()
            .map(|key| row.value(&key.field).clone())
            .collect()
    }

    pub fn compare<E: Entity>(&self, a: &E, b: &E) -> Ordering {
        self.keys
            .iter()
            .map(|key| key.compare(a.value(&key.field), b.value(&key.field)))
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }

    pub fn compare_tuples(&self, a: &[Value], b: &[Value]) -> Ordering {
        self.keys
            .iter()
            .zip(a.iter().zip(b))
            .map(|(key, (x, y))| key.compare(x, y))
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }

    /// Whether `row` sorts strictly after the resume tuple.
    pub fn is_after<E: Entity>(&self, tuple: &[Value], row: &E) -> bool {
        self.keys
            .iter()
            .zip(tuple)
            .map(|(key, resume)| key.compare(resume, row.value(&key.field)))
            .find(|ord| *ord != Ordering::Equal)
            == Some(Ordering::Less)
    }
}

/// Compile `orderBy` keys for `entity`.
pub fn compile_order(entity: &EntitySchema, keys: &[OrderKey]) -> Result<CompiledOrder, CompileError> {
    if keys.is_empty() {
        return Err(CompileError::EmptyOrder(entity.name().to_string()));
    }

    let mut seen = HashSet::new();
    let mut resolved = Vec::with_capacity(keys.len() + 1);
    let mut total = false;

    for key in keys {
        let field = entity.require_field(&key.field)?;
        if !field.ty.is_orderable() {
            return Err(CompileError::UnorderableField {
                field: field.name.clone(),
                kind: field.ty.to_string(),
            });
        }
        if !seen.insert(field.name.as_str()) {
            return Err(CompileError::DuplicateOrderField(field.name.clone()));
        }
        total |= field.name == EntitySchema::ID_FIELD;
        resolved.push(SortKey {
            field: field.name.clone(),
            ty: field.ty.clone(),
            direction: key.direction,
            nulls_first: key.effective_nulls_first(),
            nullable: field.nullable,
        });
    }

    if !total {
        resolved.push(SortKey {
            field: EntitySchema::ID_FIELD.to_string(),
            ty: FieldType::STRING,
            direction: OrderDirection::Asc,
            nulls_first: false,
            nullable: false,
        });
    }

    Ok(CompiledOrder {
        keys: resolved,
        implicit_tiebreak: !total,
    })
}
