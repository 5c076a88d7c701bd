//! Query, list, count and sql command implementations.

use std::fs;

use anyhow::{Context, Result};
use perps_query::filters::render_count;
use perps_query::{
    compile, parse_where, perps, ConnectionArgs, InMemoryStore, ListArgs as EngineListArgs,
    OrderKey, Predicate, QueryEngine, Schema,
};
use serde_json::{json, Value as Json};
use tracing::debug;

use crate::cli::{CountArgs, DataArgs, ListArgs, OutputFormat, QueryArgs, SelectArgs, SqlArgs};
use crate::output::{format_list_summary, format_page_summary, format_records_table, format_sql};

/// Load the dataset file into an engine over the perps schema.
fn load_engine(args: &DataArgs) -> Result<QueryEngine<InMemoryStore>> {
    let raw = fs::read_to_string(&args.data)
        .with_context(|| format!("Failed to read dataset {}", args.data.display()))?;
    let dataset: Json = serde_json::from_str(&raw)
        .with_context(|| format!("Dataset {} is not valid JSON", args.data.display()))?;

    let schema = perps::schema();
    let store = InMemoryStore::from_json_dataset(&schema, &dataset)?;
    debug!(path = %args.data.display(), "loaded dataset");

    Ok(QueryEngine::with_config(schema, store, args.engine_config()))
}

/// Parse an optional `--where` JSON object; no object matches every row.
fn parse_filter(schema: &Schema, entity: &str, where_json: Option<&str>) -> Result<Predicate> {
    match where_json {
        Some(raw) => {
            let input: Json =
                serde_json::from_str(raw).context("--where is not a valid JSON object")?;
            Ok(parse_where(schema, entity, &input)?)
        }
        None => Ok(Predicate::always()),
    }
}

fn connection_args(
    schema: &Schema,
    select: &SelectArgs,
    first: i64,
    after: Option<&str>,
) -> Result<ConnectionArgs> {
    let filter = parse_filter(schema, &select.entity, select.where_json.as_deref())?;
    let args = ConnectionArgs::new(first)
        .filter(filter)
        .order_by(OrderKey::parse_all(&select.order_by)?);
    Ok(match after {
        Some(cursor) => args.after(cursor),
        None => args,
    })
}

fn print_json(value: &Json) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub async fn run_query(args: &QueryArgs, format: OutputFormat) -> Result<()> {
    let engine = load_engine(&args.data)?;
    let request = connection_args(
        engine.schema(),
        &args.select,
        args.first,
        args.after.as_deref(),
    )?;

    let page = engine.paginate(&args.select.entity, &request).await?;

    match format {
        OutputFormat::Json => print_json(&serde_json::to_value(&page)?)?,
        OutputFormat::Table => {
            let entity = engine.schema().entity(&args.select.entity)?;
            let rows: Vec<_> = page.nodes().cloned().collect();
            println!("{}", format_records_table(entity, &rows));
            println!("{}", format_page_summary(&page));
        }
    }

    Ok(())
}

pub async fn run_list(args: &ListArgs, format: OutputFormat) -> Result<()> {
    let engine = load_engine(&args.data)?;
    let select = &args.select;
    let filter = parse_filter(engine.schema(), &select.entity, select.where_json.as_deref())?;
    let request = EngineListArgs::new(args.limit)
        .filter(filter)
        .order_by(OrderKey::parse_all(&select.order_by)?)
        .offset(args.offset);

    let page = engine.list(&select.entity, &request).await?;

    match format {
        OutputFormat::Json => print_json(&serde_json::to_value(&page)?)?,
        OutputFormat::Table => {
            let entity = engine.schema().entity(&select.entity)?;
            println!("{}", format_records_table(entity, &page.rows));
            if let Some(summary) = format_list_summary(&page) {
                println!("{summary}");
            }
        }
    }

    Ok(())
}

pub async fn run_count(args: &CountArgs, format: OutputFormat) -> Result<()> {
    let engine = load_engine(&args.data)?;
    let filter = parse_filter(engine.schema(), &args.entity, args.where_json.as_deref())?;

    let count = engine.count(&args.entity, &filter).await?;

    match format {
        OutputFormat::Json => print_json(&json!({"entity": args.entity, "count": count}))?,
        OutputFormat::Table => println!("{count}"),
    }

    Ok(())
}

/// Explain needs no rows, so the engine runs over an empty store.
pub fn run_sql(args: &SqlArgs, format: OutputFormat) -> Result<()> {
    let engine = QueryEngine::new(perps::schema(), InMemoryStore::new());
    let select = &args.select;

    let query = if args.count {
        let filter = parse_filter(engine.schema(), &select.entity, select.where_json.as_deref())?;
        let compiled = compile(engine.schema(), &select.entity, &filter)?;
        render_count(&select.entity, &compiled)
    } else {
        let request = connection_args(engine.schema(), select, args.first, args.after.as_deref())?;
        engine.explain(&select.entity, &request)?.to_sql()
    };

    match format {
        OutputFormat::Json => {
            let params: Vec<Json> = query.params.iter().map(|p| p.to_json()).collect();
            print_json(&json!({"sql": query.sql, "params": params}))?;
        }
        OutputFormat::Table => println!("{}", format_sql(&query)),
    }

    Ok(())
}
