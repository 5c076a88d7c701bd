//! CLI argument definitions using clap.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use perps_query::{EngineConfig, PageSizePolicy, DEFAULT_MAX_PAGE_SIZE};

/// Perps Query CLI - Filter and paginate perps datasets
#[derive(Parser, Debug)]
#[command(name = "perps-query")]
#[command(about = "CLI tool for filtering and paginating perps datasets", long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(long, global = true, default_value = "table")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch one page of a cursor connection
    Query(QueryArgs),
    /// Fetch rows with limit/offset paging
    List(ListArgs),
    /// Count rows matching a filter
    Count(CountArgs),
    /// Print the SQL a backend would run for a page
    Sql(SqlArgs),
    /// Describe the entities, fields and relations of the perps schema
    Schema(SchemaArgs),
}

/// Dataset and engine settings shared by commands that read rows.
#[derive(Args, Debug)]
pub struct DataArgs {
    /// JSON dataset file, e.g. {"Position": [...], "Trade": [...]}
    #[arg(long, env = "PERPS_QUERY_DATA")]
    pub data: PathBuf,

    /// Largest accepted page size
    #[arg(long, env = "PERPS_QUERY_MAX_PAGE_SIZE", default_value_t = DEFAULT_MAX_PAGE_SIZE)]
    pub max_page_size: usize,

    /// Clamp oversized pages to the maximum instead of rejecting them
    #[arg(long, env = "PERPS_QUERY_CLAMP")]
    pub clamp: bool,

    /// Backend call timeout in milliseconds (0 disables)
    #[arg(long, env = "PERPS_QUERY_TIMEOUT_MS", default_value = "30000")]
    pub timeout_ms: u64,
}

impl DataArgs {
    pub fn engine_config(&self) -> EngineConfig {
        let policy = if self.clamp {
            PageSizePolicy::Clamp
        } else {
            PageSizePolicy::Reject
        };
        let config = EngineConfig::new()
            .with_max_page_size(self.max_page_size)
            .with_page_size_policy(policy);
        if self.timeout_ms == 0 {
            config.without_fetch_timeout()
        } else {
            config.with_fetch_timeout(Duration::from_millis(self.timeout_ms))
        }
    }
}

/// Entity, filter and ordering.
#[derive(Args, Debug)]
pub struct SelectArgs {
    /// Entity to query (Market, Position, Order, Trade)
    #[arg(short, long)]
    pub entity: String,

    /// Where object as JSON, e.g. '{"isLong_eq": true}'
    #[arg(short = 'w', long = "where")]
    pub where_json: Option<String>,

    /// Order key such as sizeInUsd_DESC or closedAt_ASC_NULLS_FIRST (repeatable).
    /// Required for query, list and sql
    #[arg(short, long = "order-by")]
    pub order_by: Vec<String>,
}

#[derive(Parser, Debug)]
pub struct QueryArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub select: SelectArgs,

    /// Page size
    #[arg(short = 'n', long, default_value = "25", allow_negative_numbers = true)]
    pub first: i64,

    /// Resume after this cursor (the endCursor of the previous page)
    #[arg(long)]
    pub after: Option<String>,
}

#[derive(Parser, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub select: SelectArgs,

    /// Limit the number of results
    #[arg(short = 'n', long, default_value = "25", allow_negative_numbers = true)]
    pub limit: i64,

    /// Number of matching rows to skip
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    pub offset: i64,
}

#[derive(Parser, Debug)]
pub struct CountArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Entity to count
    #[arg(short, long)]
    pub entity: String,

    /// Where object as JSON
    #[arg(short = 'w', long = "where")]
    pub where_json: Option<String>,
}

#[derive(Parser, Debug)]
pub struct SqlArgs {
    #[command(flatten)]
    pub select: SelectArgs,

    /// Page size
    #[arg(short = 'n', long, default_value = "25")]
    pub first: i64,

    /// Resume after this cursor
    #[arg(long)]
    pub after: Option<String>,

    /// Print the count query instead of the page query
    #[arg(long)]
    pub count: bool,
}

#[derive(Parser, Debug)]
pub struct SchemaArgs {
    /// Only describe this entity
    pub entity: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}
