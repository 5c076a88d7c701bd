//! Type definitions for the query engine.

pub mod connection;
pub mod ordering;
pub mod record;
pub mod scalars;
pub mod schema;
pub mod value;

pub use connection::{Connection, Cursor, Edge, ListPage, PageInfo};
pub use ordering::{NullsPosition, OrderDirection, OrderKey};
pub use record::{Entity, Record};
pub use schema::{EntitySchema, EnumDef, FieldDef, FieldType, RelationDef, Schema};
pub use value::{ScalarKind, Value};
