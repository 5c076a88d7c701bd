//! Perps Query Engine
//!
//! This crate filters, orders and paginates indexed perpetual-exchange entities
//! (markets, positions, orders, trades) behind a storage-agnostic engine.
//!
//! # Example
//!
//! ```no_run
//! use perps_query::{
//!     parse_where, perps, ConnectionArgs, InMemoryStore, OrderKey, QueryEngine,
//! };
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), perps_query::QueryError> {
//!     let schema = perps::schema();
//!     let dataset = json!({"Position": []});
//!     let store = InMemoryStore::from_json_dataset(&schema, &dataset)?;
//!
//!     let filter = parse_where(&schema, "Position", &json!({
//!         "isLong_eq": true,
//!         "sizeInUsd_gt": "10000000000000000000000000000000000",
//!         "trades_every": {"pnlUsd_gte": "0"}
//!     }))?;
//!     let engine = QueryEngine::new(schema, store);
//!
//!     let mut args = ConnectionArgs::new(50)
//!         .filter(filter)
//!         .order_by(["sizeInUsd_DESC_NULLS_LAST".parse::<OrderKey>()?]);
//!     loop {
//!         let page = engine.paginate("Position", &args).await?;
//!         for edge in &page.edges {
//!             tracing::info!(cursor = %edge.cursor, "position");
//!         }
//!         if !page.page_info.has_next_page {
//!             break;
//!         }
//!         args = args.after_opt(page.page_info.end_cursor);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Pipeline
//!
//! 1. A [`Predicate`] (built directly or parsed from a where object) is
//!    compiled against the [`Schema`] into a [`CompiledFilter`].
//! 2. The `orderBy` keys compile into a [`CompiledOrder`]; `id ASC` is appended
//!    when no key is unique on its own, so every order is total.
//! 3. The `after` cursor decodes into a resume tuple, added to the filter as a
//!    strictly-after condition.
//! 4. An [`EntityStore`] executes the resulting [`FetchPlan`], either in memory
//!    or as SQL via [`FetchPlan::to_sql`].
//!
//! # Error Handling
//!
//! All errors are unified through [`QueryError`]. Compile and pagination errors
//! are raised before the store is called; store errors pass through unchanged.
//! Use [`QueryError::category()`] for classification and
//! [`QueryError::is_retryable()`] to decide whether a retry makes sense.

pub mod config;
pub mod connection;
pub mod cursor;
pub mod error;
pub mod filters;
pub mod order;
pub mod perps;
pub mod store;
pub mod types;

// Re-export main types at crate root
pub use config::{EngineConfig, PageSizePolicy, DEFAULT_FETCH_TIMEOUT, DEFAULT_MAX_PAGE_SIZE};
pub use connection::{ConnectionArgs, ListArgs, QueryEngine};
pub use cursor::{CursorCodec, CURSOR_VERSION};
pub use error::{
    BackendError, CompileError, ErrorCategory, PaginationError, QueryError, Result,
};
pub use filters::{
    compile, parse_where, CompiledFilter, Condition, Operator, Predicate, Quantifier, SqlQuery,
};
pub use order::{compile_order, CompiledOrder, SortKey};
pub use store::{EntityStore, FetchPlan, InMemoryStore};
pub use types::{
    Connection, Cursor, Edge, Entity, EntitySchema, EnumDef, FieldDef, FieldType, ListPage,
    NullsPosition, OrderDirection, OrderKey, PageInfo, Record, RelationDef, ScalarKind, Schema, Value,
};
