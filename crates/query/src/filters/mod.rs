//! Filtering: predicate AST, operator registry, where-input parsing,
//! compilation and SQL rendering.
//!
//! # Architecture
//!
//! - **[`Predicate`]**: untyped condition tree, built directly or parsed from a
//!   GraphQL-style where object with [`parse_where`]
//! - **[`Operator`]**: the operator registry, including which field types accept
//!   which operators
//! - **[`compile`]**: validates a predicate against a [`Schema`](crate::Schema)
//!   and produces a [`CompiledFilter`] that is evaluated in memory or rendered
//!   to SQL via [`sql`]
//!
//! ```
//! use perps_query::filters::{compile, parse_where};
//! use perps_query::perps;
//! use serde_json::json;
//!
//! let schema = perps::schema();
//! let predicate = parse_where(
//!     &schema,
//!     "Position",
//!     &json!({"isLong_eq": true, "trades_some": {"pnlUsd_gt": "0"}}),
//! )?;
//! let filter = compile(&schema, "Position", &predicate)?;
//! # let _ = filter;
//! # Ok::<(), perps_query::QueryError>(())
//! ```

pub mod compiler;
pub mod operators;
pub mod predicate;
pub mod sql;
pub mod where_input;

pub use compiler::{compile, CompiledFilter, RelationSource};
pub use operators::{ArrayOp, CompareOp, Condition, Operator, TextOp};
pub use predicate::{FieldPredicate, Predicate, Quantifier, RelationPredicate};
pub use sql::{render_count, render_where, SqlQuery};
pub use where_input::parse_where;
