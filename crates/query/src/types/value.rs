//! Dynamic field values.

use std::cmp::Ordering;
use std::fmt;

use num_bigint::BigInt;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Scalar kinds a field can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarKind {
    String,
    Int,
    Float,
    /// Arbitrary-precision integer.
    BigInt,
    BigDecimal,
    Boolean,
}

impl ScalarKind {
    /// Whether values of this kind are numbers.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            ScalarKind::Int | ScalarKind::Float | ScalarKind::BigInt | ScalarKind::BigDecimal
        )
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarKind::String => "String",
            ScalarKind::Int => "Int",
            ScalarKind::Float => "Float",
            ScalarKind::BigInt => "BigInt",
            ScalarKind::BigDecimal => "BigDecimal",
            ScalarKind::Boolean => "Boolean",
        };
        f.write_str(name)
    }
}

/// A field value read from an entity row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "v")]
pub enum Value {
    Null,
    Boolean(bool),
    Int(i64),
    Float(f64),
    BigInt(BigInt),
    BigDecimal(Decimal),
    String(String),
    Enum(String),
    List(Vec<Value>),
}

/// Shared null, returned for absent fields.
pub static NULL: Value = Value::Null;

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Borrow the text of a `String` or `Enum` value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Enum(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Kind of a scalar value. `None` for nulls, enum literals and lists.
    pub fn scalar_kind(&self) -> Option<ScalarKind> {
        match self {
            Value::Boolean(_) => Some(ScalarKind::Boolean),
            Value::Int(_) => Some(ScalarKind::Int),
            Value::Float(_) => Some(ScalarKind::Float),
            Value::BigInt(_) => Some(ScalarKind::BigInt),
            Value::BigDecimal(_) => Some(ScalarKind::BigDecimal),
            Value::String(_) => Some(ScalarKind::String),
            Value::Null | Value::Enum(_) | Value::List(_) => None,
        }
    }

    /// Compare two values of the same kind.
    ///
    /// Returns `None` for nulls, lists and values of different kinds.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => Some(float_cmp(*a, *b)),
            (Value::BigInt(a), Value::BigInt(b)) => Some(a.cmp(b)),
            (Value::BigDecimal(a), Value::BigDecimal(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) | (Value::Enum(a), Value::Enum(b)) => {
                Some(a.cmp(b))
            }
            _ => None,
        }
    }

    /// Equality under [`Value::compare`] (so `0.0 == -0.0` and `NaN == NaN`).
    pub fn same_as(&self, other: &Value) -> bool {
        self.compare(other) == Some(Ordering::Equal)
    }

    /// Total order used for sorting: same-kind values compare naturally,
    /// anything else falls back to a fixed rank per variant.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        self.compare(other)
            .unwrap_or_else(|| self.rank().cmp(&other.rank()))
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Boolean(_) => 1,
            Value::Int(_) => 2,
            Value::Float(_) => 3,
            Value::BigInt(_) => 4,
            Value::BigDecimal(_) => 5,
            Value::String(_) => 6,
            Value::Enum(_) => 7,
            Value::List(_) => 8,
        }
    }

    /// Plain JSON rendering. Big numbers become decimal strings.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;

        match self {
            Value::Null => Json::Null,
            Value::Boolean(b) => Json::Bool(*b),
            Value::Int(i) => Json::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f).map_or(Json::Null, Json::Number),
            Value::BigInt(i) => Json::String(i.to_string()),
            Value::BigDecimal(d) => Json::String(d.to_string()),
            Value::String(s) | Value::Enum(s) => Json::String(s.clone()),
            Value::List(items) => Json::Array(items.iter().map(Value::to_json).collect()),
        }
    }
}

/// PostgreSQL float ordering: `-0.0` equals `0.0`, NaNs are equal to each
/// other and greater than every number.
fn float_cmp(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::BigInt(i) => write!(f, "{i}"),
            Value::BigDecimal(d) => write!(f, "{d}"),
            Value::String(s) | Value::Enum(s) => f.write_str(s),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<BigInt> for Value {
    fn from(i: BigInt) -> Self {
        Value::BigInt(i)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::BigDecimal(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}
