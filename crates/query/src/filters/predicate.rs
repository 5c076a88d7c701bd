//! Predicate AST built from client input.

use serde_json::Value as Json;

use crate::filters::operators::Operator;

/// Quantifier of a relation predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantifier {
    /// At least one related row matches.
    Some,
    /// No related row matches.
    None,
    /// Every related row matches (vacuously true with no related rows).
    Every,
}

impl Quantifier {
    pub const ALL: [Quantifier; 3] = [Quantifier::Some, Quantifier::None, Quantifier::Every];

    pub fn name(self) -> &'static str {
        match self {
            Quantifier::Some => "some",
            Quantifier::None => "none",
            Quantifier::Every => "every",
        }
    }
}

/// Condition on a single field. The operand stays raw until compilation.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldPredicate {
    pub field: String,
    pub operator: Operator,
    pub operand: Json,
}

/// Condition on a one-to-many relation.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationPredicate {
    pub relation: String,
    pub quantifier: Quantifier,
    pub predicate: Box<Predicate>,
}

/// Boolean condition tree over entity fields.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Field(FieldPredicate),
    /// Conjunction; empty means always true.
    And(Vec<Predicate>),
    /// Disjunction; empty means always false.
    Or(Vec<Predicate>),
    Relation(RelationPredicate),
}

impl Predicate {
    pub fn field(field: impl Into<String>, operator: Operator, operand: impl Into<Json>) -> Self {
        Predicate::Field(FieldPredicate {
            field: field.into(),
            operator,
            operand: operand.into(),
        })
    }

    pub fn eq(field: impl Into<String>, operand: impl Into<Json>) -> Self {
        Self::field(field, Operator::Eq, operand)
    }

    pub fn is_null(field: impl Into<String>, is_null: bool) -> Self {
        Self::field(field, Operator::IsNull, is_null)
    }

    pub fn and<I: IntoIterator<Item = Predicate>>(children: I) -> Self {
        Predicate::And(children.into_iter().collect())
    }

    pub fn or<I: IntoIterator<Item = Predicate>>(children: I) -> Self {
        Predicate::Or(children.into_iter().collect())
    }

    /// Matches every row.
    pub fn always() -> Self {
        Predicate::And(Vec::new())
    }

    pub fn relation(relation: impl Into<String>, quantifier: Quantifier, predicate: Predicate) -> Self {
        Predicate::Relation(RelationPredicate {
            relation: relation.into(),
            quantifier,
            predicate: Box::new(predicate),
        })
    }

    pub fn some(relation: impl Into<String>, predicate: Predicate) -> Self {
        Self::relation(relation, Quantifier::Some, predicate)
    }

    pub fn none(relation: impl Into<String>, predicate: Predicate) -> Self {
        Self::relation(relation, Quantifier::None, predicate)
    }

    pub fn every(relation: impl Into<String>, predicate: Predicate) -> Self {
        Self::relation(relation, Quantifier::Every, predicate)
    }
}
