//! Perps Query CLI - Filter, order and paginate perps datasets.

mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use commands::{run_count, run_list, run_query, run_schema, run_sql};

/// Logs go to stderr so JSON output on stdout stays parseable. `RUST_LOG`
/// overrides the default `warn` level.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Commands::Query(args) => {
            run_query(&args, cli.format).await?;
        }
        Commands::List(args) => {
            run_list(&args, cli.format).await?;
        }
        Commands::Count(args) => {
            run_count(&args, cli.format).await?;
        }
        Commands::Sql(args) => {
            run_sql(&args, cli.format)?;
        }
        Commands::Schema(args) => {
            run_schema(&args, cli.format)?;
        }
    }

    Ok(())
}
