//! Conversions from JSON input (where operands, dataset rows) to typed [`Value`]s.

use std::str::FromStr;

use num_bigint::BigInt;
use rust_decimal::Decimal;
use serde_json::Value as Json;
use thiserror::Error;

use crate::types::schema::FieldType;
use crate::types::value::{ScalarKind, Value};

/// Why a JSON value could not be read as a field value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScalarError {
    #[error("expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("'{value}' is not a value of enum {enum_name}")]
    UnknownEnumValue { enum_name: String, value: String },
}

/// Parse a BigInt from its decimal string form.
pub fn parse_bigint(s: &str) -> Option<BigInt> {
    BigInt::from_str(s.trim()).ok()
}

/// Parse a BigDecimal from plain or scientific notation.
pub fn parse_decimal(s: &str) -> Option<Decimal> {
    let s = s.trim();
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

fn describe(json: &Json) -> String {
    match json {
        Json::Null => "null".to_string(),
        Json::Bool(b) => format!("boolean {b}"),
        Json::Number(n) => format!("number {n}"),
        Json::String(s) => format!("string \"{s}\""),
        Json::Array(_) => "list".to_string(),
        Json::Object(_) => "object".to_string(),
    }
}

fn mismatch(expected: impl Into<String>, json: &Json) -> ScalarError {
    ScalarError::TypeMismatch {
        expected: expected.into(),
        found: describe(json),
    }
}

/// Read a non-null scalar of the given kind.
///
/// BigInt accepts decimal strings (the canonical wire form) and integral
/// JSON numbers; floating point numbers are rejected rather than truncated.
pub fn scalar_from_json(kind: ScalarKind, json: &Json) -> Result<Value, ScalarError> {
    match (kind, json) {
        (ScalarKind::String, Json::String(s)) => Ok(Value::String(s.clone())),
        (ScalarKind::Boolean, Json::Bool(b)) => Ok(Value::Boolean(*b)),
        (ScalarKind::Int, Json::Number(n)) => n
            .as_i64()
            .map(Value::Int)
            .ok_or_else(|| mismatch("Int", json)),
        (ScalarKind::Float, Json::Number(n)) => n
            .as_f64()
            .map(Value::Float)
            .ok_or_else(|| mismatch("Float", json)),
        (ScalarKind::BigInt, Json::String(s)) => parse_bigint(s)
            .map(Value::BigInt)
            .ok_or_else(|| mismatch("BigInt", json)),
        (ScalarKind::BigInt, Json::Number(n)) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::BigInt(BigInt::from(i)))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::BigInt(BigInt::from(u)))
            } else {
                Err(mismatch("BigInt (pass large values as strings)", json))
            }
        }
        (ScalarKind::BigDecimal, Json::String(s)) => parse_decimal(s)
            .map(Value::BigDecimal)
            .ok_or_else(|| mismatch("BigDecimal", json)),
        (ScalarKind::BigDecimal, Json::Number(n)) => parse_decimal(&n.to_string())
            .map(Value::BigDecimal)
            .ok_or_else(|| mismatch("BigDecimal", json)),
        _ => Err(mismatch(kind.to_string(), json)),
    }
}

/// Read a value of the given field type. JSON `null` maps to [`Value::Null`].
pub fn value_from_json(ty: &FieldType, json: &Json) -> Result<Value, ScalarError> {
    if json.is_null() {
        return Ok(Value::Null);
    }
    match ty {
        FieldType::Scalar(kind) => scalar_from_json(*kind, json),
        FieldType::Enum(def) => match json {
            Json::String(s) if def.contains(s) => Ok(Value::Enum(s.clone())),
            Json::String(s) => Err(ScalarError::UnknownEnumValue {
                enum_name: def.name.clone(),
                value: s.clone(),
            }),
            _ => Err(mismatch(def.name.clone(), json)),
        },
        FieldType::List(kind) => match json {
            Json::Array(items) => items
                .iter()
                .map(|item| scalar_from_json(*kind, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            _ => Err(mismatch(ty.to_string(), json)),
        },
    }
}
