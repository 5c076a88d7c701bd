//! Output formatting for CLI results.

pub mod detail;
pub mod table;

pub use detail::{format_entity_detail, format_list_summary, format_page_summary, format_sql};
pub use table::format_records_table;
