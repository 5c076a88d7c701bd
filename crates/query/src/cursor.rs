//! Opaque pagination cursors.
//!
//! A token is URL-safe base64 of a JSON payload `{v, sig, key}`:
//!
//! - `v`: payload version ([`CURSOR_VERSION`])
//! - `sig`: SHA-256 over the entity, compiled order and compiled filter the
//!   cursor was issued for
//! - `key`: the row's sort-key tuple, in order-key order
//!
//! A cursor only resumes the exact request that produced it. A different
//! order, filter or version yields [`PaginationError::StaleCursor`] instead of
//! silently skipping or repeating rows.

use std::fmt::Write as _;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{PaginationError, QueryError, Result};
use crate::filters::CompiledFilter;
use crate::order::CompiledOrder;
use crate::types::connection::Cursor;
use crate::types::record::Entity;
use crate::types::value::Value;

/// Current payload version. Bump when the payload layout changes.
pub const CURSOR_VERSION: u32 = 1;

/// Tokens longer than this are rejected before decoding.
pub const MAX_CURSOR_LEN: usize = 8 * 1024;

const SIGNATURE_BYTES: usize = 16;

#[derive(Debug, Serialize, Deserialize)]
struct CursorPayload {
    v: u32,
    sig: String,
    key: Vec<Value>,
}

/// Encodes and decodes cursors for one (entity, order, filter) request shape.
#[derive(Debug, Clone)]
pub struct CursorCodec<'a> {
    order: &'a CompiledOrder,
    signature: String,
}

impl<'a> CursorCodec<'a> {
    pub fn new(entity: &str, order: &'a CompiledOrder, filter: &CompiledFilter) -> Self {
        Self {
            order,
            signature: signature(entity, order, filter),
        }
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Cursor pointing at `row`.
    pub fn encode<E: Entity>(&self, row: &E) -> Result<Cursor> {
        let payload = CursorPayload {
            v: CURSOR_VERSION,
            sig: self.signature.clone(),
            key: self.order.tuple(row),
        };
        let bytes = serde_json::to_vec(&payload)
            .map_err(|e| QueryError::Parse(format!("Failed to encode cursor: {e}")))?;
        Ok(Cursor::from(URL_SAFE_NO_PAD.encode(bytes)))
    }

    /// Resume tuple carried by `cursor`.
    pub fn decode(&self, cursor: &Cursor) -> std::result::Result<Vec<Value>, PaginationError> {
        let token = cursor.as_str();
        if token.len() > MAX_CURSOR_LEN {
            return Err(PaginationError::MalformedCursor(format!(
                "token exceeds {MAX_CURSOR_LEN} bytes"
            )));
        }

        let bytes = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|e| PaginationError::MalformedCursor(e.to_string()))?;
        let payload: CursorPayload = serde_json::from_slice(&bytes)
            .map_err(|e| PaginationError::MalformedCursor(e.to_string()))?;

        if payload.v != CURSOR_VERSION {
            return Err(PaginationError::StaleCursor(format!(
                "cursor version {} is not {}",
                payload.v, CURSOR_VERSION
            )));
        }
        if payload.sig != self.signature {
            return Err(PaginationError::StaleCursor(
                "cursor was issued for a different order or filter".to_string(),
            ));
        }

        let keys = self.order.keys();
        if payload.key.len() != keys.len() {
            return Err(PaginationError::MalformedCursor(format!(
                "expected {} key values, found {}",
                keys.len(),
                payload.key.len()
            )));
        }
        for (key, value) in keys.iter().zip(&payload.key) {
            if value.is_null() {
                if !key.nullable {
                    return Err(PaginationError::MalformedCursor(format!(
                        "null value for non-nullable key {}",
                        key.field
                    )));
                }
            } else if !key.ty.admits(value) {
                return Err(PaginationError::MalformedCursor(format!(
                    "value {} does not fit key {} of type {}",
                    value, key.field, key.ty
                )));
            }
        }

        Ok(payload.key)
    }
}

fn signature(entity: &str, order: &CompiledOrder, filter: &CompiledFilter) -> String {
    let mut hasher = Sha256::new();
    hasher.update(entity.as_bytes());
    hasher.update([0u8]);
    if let Ok(bytes) = serde_json::to_vec(order) {
        hasher.update(bytes);
    }
    hasher.update([0u8]);
    if let Ok(bytes) = serde_json::to_vec(filter) {
        hasher.update(bytes);
    }

    let mut hex = String::with_capacity(SIGNATURE_BYTES * 2);
    for byte in &hasher.finalize()[..SIGNATURE_BYTES] {
        let _ = write!(hex, "{byte:02x}");
    }
    hex
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{compile, Predicate};
    use crate::order::compile_order;
    use crate::types::ordering::OrderKey;
    use crate::types::record::Record;
    use crate::types::schema::{EntitySchema, FieldType, Schema};

    fn schema() -> Schema {
        Schema::new().with_entity(
            EntitySchema::new("Position")
                .field("account", FieldType::STRING)
                .nullable("size", FieldType::BIG_INT),
        )
    }

    fn order(keys: &[OrderKey]) -> CompiledOrder {
        compile_order(schema().entity("Position").unwrap(), keys).unwrap()
    }

    fn filter(predicate: &Predicate) -> CompiledFilter {
        compile(&schema(), "Position", predicate).unwrap()
    }

    #[test]
    fn test_round_trip() {
        let order = order(&[OrderKey::desc("size")]);
        let filter = filter(&Predicate::eq("account", "0xabc"));
        let codec = CursorCodec::new("Position", &order, &filter);

        let big: num_bigint::BigInt = "123456789012345678901234567890".parse().unwrap();
        let row = Record::new("p1").with("size", Value::BigInt(big.clone()));
        let cursor = codec.encode(&row).unwrap();

        assert!(!cursor.as_str().contains(['+', '/', '=']));
        assert_eq!(
            codec.decode(&cursor).unwrap(),
            vec![Value::BigInt(big), Value::from("p1")]
        );

        let null_row = Record::new("p2").with("size", Value::Null);
        let cursor = codec.encode(&null_row).unwrap();
        assert_eq!(
            codec.decode(&cursor).unwrap(),
            vec![Value::Null, Value::from("p2")]
        );
    }

    #[test]
    fn test_stale_when_order_or_filter_changes() {
        let asc = order(&[OrderKey::asc("size")]);
        let desc = order(&[OrderKey::desc("size")]);
        let all = filter(&Predicate::always());
        let some = filter(&Predicate::eq("account", "0xabc"));

        let cursor = CursorCodec::new("Position", &asc, &all)
            .encode(&Record::new("p1"))
            .unwrap();

        assert!(CursorCodec::new("Position", &asc, &all).decode(&cursor).is_ok());
        assert!(matches!(
            CursorCodec::new("Position", &desc, &all).decode(&cursor),
            Err(PaginationError::StaleCursor(_))
        ));
        assert!(matches!(
            CursorCodec::new("Position", &asc, &some).decode(&cursor),
            Err(PaginationError::StaleCursor(_))
        ));
        assert!(matches!(
            CursorCodec::new("Trade", &asc, &all).decode(&cursor),
            Err(PaginationError::StaleCursor(_))
        ));
    }

    #[test]
    fn test_stale_version() {
        let order = order(&[OrderKey::asc("size")]);
        let filter = filter(&Predicate::always());
        let codec = CursorCodec::new("Position", &order, &filter);

        let payload = serde_json::json!({
            "v": CURSOR_VERSION + 1,
            "sig": codec.signature(),
            "key": [{"t": "Null"}, {"t": "String", "v": "p1"}],
        });
        let cursor = Cursor::from(URL_SAFE_NO_PAD.encode(payload.to_string()));
        assert!(matches!(
            codec.decode(&cursor),
            Err(PaginationError::StaleCursor(_))
        ));
    }

    #[test]
    fn test_malformed_tokens() {
        let order = order(&[OrderKey::asc("size")]);
        let filter = filter(&Predicate::always());
        let codec = CursorCodec::new("Position", &order, &filter);

        let partial = URL_SAFE_NO_PAD.encode(r#"{"v":1}"#);
        for token in ["not base64!", "", partial.as_str()] {
            assert!(
                matches!(
                    codec.decode(&Cursor::from(token)),
                    Err(PaginationError::MalformedCursor(_))
                ),
                "{token}"
            );
        }

        let short = serde_json::json!({
            "v": CURSOR_VERSION,
            "sig": codec.signature(),
            "key": [{"t": "String", "v": "p1"}],
        });
        assert!(matches!(
            codec.decode(&Cursor::from(URL_SAFE_NO_PAD.encode(short.to_string()))),
            Err(PaginationError::MalformedCursor(_))
        ));

        let null_id = serde_json::json!({
            "v": CURSOR_VERSION,
            "sig": codec.signature(),
            "key": [{"t": "Null"}, {"t": "Null"}],
        });
        assert!(matches!(
            codec.decode(&Cursor::from(URL_SAFE_NO_PAD.encode(null_id.to_string()))),
            Err(PaginationError::MalformedCursor(_))
        ));

        let wrong_kinds = serde_json::json!({
            "v": CURSOR_VERSION,
            "sig": codec.signature(),
            "key": [{"t": "String", "v": "hello"}, {"t": "Int", "v": 5}],
        });
        assert!(matches!(
            codec.decode(&Cursor::from(URL_SAFE_NO_PAD.encode(wrong_kinds.to_string()))),
            Err(PaginationError::MalformedCursor(ref msg)) if msg.contains("size")
        ));

        let int_for_id = serde_json::json!({
            "v": CURSOR_VERSION,
            "sig": codec.signature(),
            "key": [{"t": "BigInt", "v": [1, [5]]}, {"t": "Int", "v": 5}],
        });
        assert!(matches!(
            codec.decode(&Cursor::from(URL_SAFE_NO_PAD.encode(int_for_id.to_string()))),
            Err(PaginationError::MalformedCursor(_))
        ));

        let huge = Cursor::from("A".repeat(MAX_CURSOR_LEN + 1));
        assert!(matches!(
            codec.decode(&huge),
            Err(PaginationError::MalformedCursor(_))
        ));
    }
}
