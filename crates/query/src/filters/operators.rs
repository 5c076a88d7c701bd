//! Operator registry.
//!
//! Where-input suffixes (`_eq`, `_not_in`, `_containsInsensitive`, ...) are parsed
//! once into [`Operator`] and resolved against the field's type into a typed
//! [`Condition`]. Row evaluation only ever sees `Condition`.
//!
//! Null handling follows SQL three-valued logic so in-memory evaluation and
//! pushdown agree: every condition except `isNull` is false on a null field,
//! negated operators included.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::Value as Json;

use crate::error::CompileError;
use crate::types::scalars::{scalar_from_json, value_from_json, ScalarError};
use crate::types::schema::{FieldDef, FieldType};
use crate::types::value::{ScalarKind, Value};

/// Filter operators accepted in where input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Operator {
    Eq,
    NotEq,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    NotIn,
    Contains,
    NotContains,
    ContainsInsensitive,
    NotContainsInsensitive,
    StartsWith,
    NotStartsWith,
    EndsWith,
    NotEndsWith,
    IsNull,
    ContainsAll,
    ContainsAny,
    ContainsNone,
}

impl Operator {
    pub const ALL: [Operator; 20] = [
        Operator::Eq,
        Operator::NotEq,
        Operator::Gt,
        Operator::Gte,
        Operator::Lt,
        Operator::Lte,
        Operator::In,
        Operator::NotIn,
        Operator::Contains,
        Operator::NotContains,
        Operator::ContainsInsensitive,
        Operator::NotContainsInsensitive,
        Operator::StartsWith,
        Operator::NotStartsWith,
        Operator::EndsWith,
        Operator::NotEndsWith,
        Operator::IsNull,
        Operator::ContainsAll,
        Operator::ContainsAny,
        Operator::ContainsNone,
    ];

    /// Name as it appears after the field name in where input.
    pub fn name(self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::NotEq => "not_eq",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::In => "in",
            Operator::NotIn => "not_in",
            Operator::Contains => "contains",
            Operator::NotContains => "not_contains",
            Operator::ContainsInsensitive => "containsInsensitive",
            Operator::NotContainsInsensitive => "not_containsInsensitive",
            Operator::StartsWith => "startsWith",
            Operator::NotStartsWith => "not_startsWith",
            Operator::EndsWith => "endsWith",
            Operator::NotEndsWith => "not_endsWith",
            Operator::IsNull => "isNull",
            Operator::ContainsAll => "containsAll",
            Operator::ContainsAny => "containsAny",
            Operator::ContainsNone => "containsNone",
        }
    }

    pub fn from_name(name: &str) -> Option<Operator> {
        Operator::ALL.into_iter().find(|op| op.name() == name)
    }

    /// Whether the operator is defined for a field of this type.
    pub fn supported_by(self, ty: &FieldType) -> bool {
        if self == Operator::IsNull {
            return true;
        }
        let equality = matches!(
            self,
            Operator::Eq | Operator::NotEq | Operator::In | Operator::NotIn
        );
        let ordered = matches!(
            self,
            Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte
        );
        let array = matches!(
            self,
            Operator::ContainsAll | Operator::ContainsAny | Operator::ContainsNone
        );

        match ty {
            FieldType::Scalar(ScalarKind::String) => !array,
            FieldType::Scalar(ScalarKind::Boolean) => {
                matches!(self, Operator::Eq | Operator::NotEq)
            }
            FieldType::Scalar(_) => equality || ordered,
            FieldType::Enum(_) => equality,
            FieldType::List(_) => array,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operator::from_name(s).ok_or_else(|| format!("unknown operator '{s}'"))
    }
}

/// Ordered comparison against a single operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CompareOp {
    Eq,
    NotEq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    fn test(self, ord: Ordering) -> bool {
        match self {
            CompareOp::Eq => ord == Ordering::Equal,
            CompareOp::NotEq => ord != Ordering::Equal,
            CompareOp::Gt => ord == Ordering::Greater,
            CompareOp::Gte => ord != Ordering::Less,
            CompareOp::Lt => ord == Ordering::Less,
            CompareOp::Lte => ord != Ordering::Greater,
        }
    }

    pub(crate) fn sql(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::NotEq => "<>",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
        }
    }
}

/// Substring matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TextOp {
    Contains,
    /// Case-insensitive contains; the needle is stored lowercased.
    ContainsInsensitive,
    StartsWith,
    EndsWith,
}

/// Array containment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ArrayOp {
    /// Field contains every operand value.
    All,
    /// Field contains at least one operand value.
    Any,
    /// Field contains none of the operand values.
    None,
}

/// A resolved single-field condition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Condition {
    IsNull(bool),
    Compare {
        op: CompareOp,
        operand: Value,
    },
    In {
        negated: bool,
        values: Vec<Value>,
    },
    Text {
        op: TextOp,
        negated: bool,
        needle: String,
    },
    Array {
        op: ArrayOp,
        values: Vec<Value>,
    },
}

impl Condition {
    /// Resolve `operator` with a raw operand against `field`.
    pub fn resolve(field: &FieldDef, operator: Operator, operand: &Json) -> Result<Self, CompileError> {
        if !operator.supported_by(&field.ty) {
            return Err(CompileError::UnsupportedOperator {
                field: field.name.clone(),
                operator: operator.name().to_string(),
                kind: field.ty.to_string(),
            });
        }

        let invalid = |reason: String| CompileError::InvalidOperand {
            field: field.name.clone(),
            operator: operator.name().to_string(),
            reason,
        };
        let convert = |error: ScalarError| match error {
            ScalarError::UnknownEnumValue { enum_name, value } => CompileError::UnknownEnumValue {
                field: field.name.clone(),
                enum_name,
                value,
            },
            other => invalid(other.to_string()),
        };
        let single = |json: &Json| -> Result<Value, CompileError> {
            match json {
                Json::Null => Err(invalid("operand must not be null, use isNull".to_string())),
                Json::Array(_) => Err(invalid("expected a single value, found a list".to_string())),
                _ => value_from_json(&field.ty, json).map_err(convert),
            }
        };
        let list = |json: &Json| -> Result<Vec<Value>, CompileError> {
            json.as_array()
                .ok_or_else(|| invalid("expected a list".to_string()))?
                .iter()
                .map(&single)
                .collect()
        };

        let compare = |op: CompareOp| -> Result<Condition, CompileError> {
            Ok(Condition::Compare {
                op,
                operand: single(operand)?,
            })
        };
        let text = |op: TextOp, negated: bool| -> Result<Condition, CompileError> {
            let needle = operand
                .as_str()
                .ok_or_else(|| invalid("expected a string".to_string()))?;
            let needle = if op == TextOp::ContainsInsensitive {
                needle.to_lowercase()
            } else {
                needle.to_string()
            };
            Ok(Condition::Text { op, negated, needle })
        };
        let array = |op: ArrayOp| -> Result<Condition, CompileError> {
            let FieldType::List(kind) = field.ty else {
                return Err(invalid("field is not a list".to_string()));
            };
            let values = operand
                .as_array()
                .ok_or_else(|| invalid("expected a list".to_string()))?
                .iter()
                .map(|item| scalar_from_json(kind, item).map_err(convert))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Condition::Array { op, values })
        };

        match operator {
            Operator::IsNull => match operand {
                Json::Bool(b) => Ok(Condition::IsNull(*b)),
                _ => Err(invalid("expected a boolean".to_string())),
            },
            Operator::Eq => compare(CompareOp::Eq),
            Operator::NotEq => compare(CompareOp::NotEq),
            Operator::Gt => compare(CompareOp::Gt),
            Operator::Gte => compare(CompareOp::Gte),
            Operator::Lt => compare(CompareOp::Lt),
            Operator::Lte => compare(CompareOp::Lte),
            Operator::In => Ok(Condition::In {
                negated: false,
                values: list(operand)?,
            }),
            Operator::NotIn => Ok(Condition::In {
                negated: true,
                values: list(operand)?,
            }),
            Operator::Contains => text(TextOp::Contains, false),
            Operator::NotContains => text(TextOp::Contains, true),
            Operator::ContainsInsensitive => text(TextOp::ContainsInsensitive, false),
            Operator::NotContainsInsensitive => text(TextOp::ContainsInsensitive, true),
            Operator::StartsWith => text(TextOp::StartsWith, false),
            Operator::NotStartsWith => text(TextOp::StartsWith, true),
            Operator::EndsWith => text(TextOp::EndsWith, false),
            Operator::NotEndsWith => text(TextOp::EndsWith, true),
            Operator::ContainsAll => array(ArrayOp::All),
            Operator::ContainsAny => array(ArrayOp::Any),
            Operator::ContainsNone => array(ArrayOp::None),
        }
    }

    /// Evaluate against a field value.
    pub fn evaluate(&self, value: &Value) -> bool {
        if let Condition::IsNull(expected) = self {
            return value.is_null() == *expected;
        }
        if value.is_null() {
            return false;
        }

        match self {
            Condition::IsNull(_) => false,
            Condition::Compare { op, operand } => {
                value.compare(operand).is_some_and(|ord| op.test(ord))
            }
            Condition::In { negated, values } => {
                values.iter().any(|v| value.same_as(v)) != *negated
            }
            Condition::Text { op, negated, needle } => {
                let Some(haystack) = value.as_str() else {
                    return false;
                };
                let found = match op {
                    TextOp::Contains => haystack.contains(needle.as_str()),
                    TextOp::ContainsInsensitive => {
                        haystack.to_lowercase().contains(needle.as_str())
                    }
                    TextOp::StartsWith => haystack.starts_with(needle.as_str()),
                    TextOp::EndsWith => haystack.ends_with(needle.as_str()),
                };
                found != *negated
            }
            Condition::Array { op, values } => {
                let Some(items) = value.as_list() else {
                    return false;
                };
                let has = |v: &Value| items.iter().any(|item| item.same_as(v));
                match op {
                    ArrayOp::All => values.iter().all(has),
                    ArrayOp::Any => values.iter().any(has),
                    ArrayOp::None => !values.iter().any(has),
                }
            }
        }
    }
}
