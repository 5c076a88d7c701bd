//! GraphQL-style where input (`{"size_gt": "100", "OR": [...], "trades_some": {...}}`)
//! parsed into a [`Predicate`].
//!
//! Keys in one object are combined with AND. `AND` and `OR` accept a list of
//! objects or a single object. Field keys are `<field>_<operator>`, relation
//! keys are `<relation>_some`, `<relation>_none` or `<relation>_every` with a
//! nested where object for the related entity.

use serde_json::{Map, Value as Json};

use crate::error::CompileError;
use crate::filters::operators::Operator;
use crate::filters::predicate::{Predicate, Quantifier};
use crate::types::schema::{EntitySchema, Schema};

/// Parse a where object for `entity`. `null` matches every row.
pub fn parse_where(schema: &Schema, entity: &str, input: &Json) -> Result<Predicate, CompileError> {
    let entity = schema.entity(entity)?;
    parse_node(schema, entity, input)
}

fn parse_node(schema: &Schema, entity: &EntitySchema, input: &Json) -> Result<Predicate, CompileError> {
    match input {
        Json::Null => Ok(Predicate::always()),
        Json::Object(map) => parse_object(schema, entity, map),
        other => Err(CompileError::InvalidWhereInput(format!(
            "expected an object for {}, found {}",
            entity.name(),
            other
        ))),
    }
}

fn parse_object(
    schema: &Schema,
    entity: &EntitySchema,
    map: &Map<String, Json>,
) -> Result<Predicate, CompileError> {
    let mut children = Vec::with_capacity(map.len());

    for (key, value) in map {
        let child = match key.as_str() {
            "AND" => Predicate::And(parse_list(schema, entity, value)?),
            "OR" => Predicate::Or(parse_list(schema, entity, value)?),
            _ => parse_key(schema, entity, key, value)?,
        };
        children.push(child);
    }

    if children.len() == 1 {
        Ok(children.remove(0))
    } else {
        Ok(Predicate::And(children))
    }
}

fn parse_list(schema: &Schema, entity: &EntitySchema, value: &Json) -> Result<Vec<Predicate>, CompileError> {
    match value {
        Json::Array(items) => items
            .iter()
            .map(|item| parse_node(schema, entity, item))
            .collect(),
        Json::Object(_) => Ok(vec![parse_node(schema, entity, value)?]),
        other => Err(CompileError::InvalidWhereInput(format!(
            "AND/OR expects a list of objects, found {other}"
        ))),
    }
}

fn parse_key(
    schema: &Schema,
    entity: &EntitySchema,
    key: &str,
    value: &Json,
) -> Result<Predicate, CompileError> {
    for quantifier in Quantifier::ALL {
        let Some(relation) = key
            .strip_suffix(quantifier.name())
            .and_then(|rest| rest.strip_suffix('_'))
        else {
            continue;
        };
        if let Some(def) = entity.get_relation(relation) {
            let target = schema.entity(&def.target)?;
            let inner = parse_node(schema, target, value)?;
            return Ok(Predicate::relation(relation, quantifier, inner));
        }
    }

    // Operator names contain underscores (`not_eq`), so prefer the longest
    // operator whose remaining prefix is a real field.
    let matched = Operator::ALL
        .into_iter()
        .filter_map(|op| {
            let field = key.strip_suffix(op.name())?.strip_suffix('_')?;
            entity.get_field(field).map(|_| (field, op))
        })
        .max_by_key(|(_, op)| op.name().len());

    if let Some((field, operator)) = matched {
        return Ok(Predicate::field(field, operator, value.clone()));
    }

    // A field followed by an unknown operator is reported as such.
    let known_field = entity
        .fields()
        .iter()
        .filter(|f| key.len() > f.name.len() + 1 && key.starts_with(&format!("{}_", f.name)))
        .max_by_key(|f| f.name.len());
    match known_field {
        Some(field) => Err(CompileError::UnsupportedOperator {
            field: field.name.clone(),
            operator: key[field.name.len() + 1..].to_string(),
            kind: field.ty.to_string(),
        }),
        None => {
            let field = Operator::ALL
                .into_iter()
                .filter_map(|op| key.strip_suffix(op.name())?.strip_suffix('_'))
                .filter(|field| !field.is_empty())
                .min_by_key(|field| field.len())
                .unwrap_or(key);
            Err(CompileError::UnknownField {
                entity: entity.name().to_string(),
                field: field.to_string(),
            })
        }
    }
}
