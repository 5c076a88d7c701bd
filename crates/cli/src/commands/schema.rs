//! Schema command implementation.

use anyhow::Result;
use perps_query::{perps, EntitySchema};

use crate::cli::{OutputFormat, SchemaArgs};
use crate::output::format_entity_detail;

pub fn run_schema(args: &SchemaArgs, format: OutputFormat) -> Result<()> {
    let schema = perps::schema();

    let entities: Vec<&EntitySchema> = match &args.entity {
        Some(name) => vec![schema.entity(name)?],
        None => schema.entities().collect(),
    };

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&entities)?);
        }
        OutputFormat::Table => {
            let sections: Vec<String> = entities.into_iter().map(format_entity_detail).collect();
            println!("{}", sections.join("\n"));
        }
    }

    Ok(())
}
