//! Filter compiler: validates a [`Predicate`] against the schema and produces an
//! executable [`CompiledFilter`].

use std::collections::HashMap;

use serde::Serialize;

use crate::error::CompileError;
use crate::filters::operators::Condition;
use crate::filters::predicate::{Predicate, Quantifier};
use crate::order::CompiledOrder;
use crate::types::record::{Entity, Record};
use crate::types::schema::{EntitySchema, RelationDef, Schema};
use crate::types::value::Value;

/// Executable filter tree.
///
/// Relation quantifiers are lowered to existence checks:
/// `some` is `Exists(p)`, `none` is `Not(Exists(p))` and `every` is
/// `Not(Exists(Not(p)))`, so `every` over an empty collection is true.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CompiledFilter {
    /// Conjunction; empty is always true.
    All(Vec<CompiledFilter>),
    /// Disjunction; empty is always false.
    Any(Vec<CompiledFilter>),
    Not(Box<CompiledFilter>),
    Field {
        field: String,
        condition: Condition,
    },
    /// Some row of the relation's target, scoped to the owner, matches `filter`.
    Exists {
        relation: RelationDef,
        filter: Box<CompiledFilter>,
    },
    /// Row sorts strictly after `tuple` under `order`.
    After {
        order: CompiledOrder,
        tuple: Vec<Value>,
    },
}

/// Resolves the related rows of an owner for [`CompiledFilter::Exists`].
pub trait RelationSource<E> {
    fn related(&self, relation: &RelationDef, owner_id: &str) -> Vec<&E>;
}

/// Collections keyed by entity name.
impl RelationSource<Record> for HashMap<String, Vec<Record>> {
    fn related(&self, relation: &RelationDef, owner_id: &str) -> Vec<&Record> {
        self.get(&relation.target)
            .map(|rows| {
                rows.iter()
                    .filter(|row| row.value(&relation.foreign_key).as_str() == Some(owner_id))
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl CompiledFilter {
    /// Filter matching every row.
    pub fn always() -> Self {
        CompiledFilter::All(Vec::new())
    }

    /// Conjunction that keeps the tree flat.
    pub fn and(self, other: CompiledFilter) -> Self {
        match self {
            CompiledFilter::All(mut children) => {
                children.push(other);
                CompiledFilter::All(children)
            }
            first => CompiledFilter::All(vec![first, other]),
        }
    }

    /// Evaluate against a row.
    pub fn matches<E: Entity>(&self, row: &E, relations: &dyn RelationSource<E>) -> bool {
        match self {
            CompiledFilter::All(children) => children.iter().all(|c| c.matches(row, relations)),
            CompiledFilter::Any(children) => children.iter().any(|c| c.matches(row, relations)),
            CompiledFilter::Not(inner) => !inner.matches(row, relations),
            CompiledFilter::Field { field, condition } => condition.evaluate(row.value(field)),
            CompiledFilter::Exists { relation, filter } => relations
                .related(relation, row.id())
                .into_iter()
                .any(|related| filter.matches(related, relations)),
            CompiledFilter::After { order, tuple } => order.is_after(tuple, row),
        }
    }
}

/// Compile a predicate for `entity`.
///
/// The whole tree is validated before anything is returned; the first invalid
/// field, operator or operand is reported.
pub fn compile(schema: &Schema, entity: &str, predicate: &Predicate) -> Result<CompiledFilter, CompileError> {
    let entity = schema.entity(entity)?;
    compile_node(schema, entity, predicate)
}

fn compile_node(
    schema: &Schema,
    entity: &EntitySchema,
    predicate: &Predicate,
) -> Result<CompiledFilter, CompileError> {
    match predicate {
        Predicate::Field(p) => {
            let field = entity.require_field(&p.field)?;
            Ok(CompiledFilter::Field {
                field: field.name.clone(),
                condition: Condition::resolve(field, p.operator, &p.operand)?,
            })
        }
        Predicate::And(children) => Ok(CompiledFilter::All(
            children
                .iter()
                .map(|c| compile_node(schema, entity, c))
                .collect::<Result<_, _>>()?,
        )),
        Predicate::Or(children) => Ok(CompiledFilter::Any(
            children
                .iter()
                .map(|c| compile_node(schema, entity, c))
                .collect::<Result<_, _>>()?,
        )),
        Predicate::Relation(p) => {
            let relation = entity.require_relation(&p.relation)?;
            let target = schema.entity(&relation.target)?;
            let inner = compile_node(schema, target, &p.predicate)?;

            let exists = |filter: CompiledFilter| CompiledFilter::Exists {
                relation: relation.clone(),
                filter: Box::new(filter),
            };
            Ok(match p.quantifier {
                Quantifier::Some => exists(inner),
                Quantifier::None => CompiledFilter::Not(Box::new(exists(inner))),
                Quantifier::Every => CompiledFilter::Not(Box::new(exists(CompiledFilter::Not(
                    Box::new(inner),
                )))),
            })
        }
    }
}
