//! Command implementations.

pub mod query;
pub mod schema;

pub use query::{run_count, run_list, run_query, run_sql};
pub use schema::run_schema;
