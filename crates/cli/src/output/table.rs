//! Table formatting for entity rows.

use perps_query::{Entity, EntitySchema, FieldType, Record, Value};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

fn truncate_address(addr: &str) -> String {
    if addr.starts_with("0x") && addr.len() > 10 {
        format!("{}...{}", &addr[..6], &addr[addr.len() - 4..])
    } else {
        addr.to_string()
    }
}

fn format_cell(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) => truncate_address(s),
        Value::List(items) if items.is_empty() => "-".to_string(),
        other => other.to_string(),
    }
}

/// Columns shown for an entity: every field, lists last.
fn columns(entity: &EntitySchema) -> Vec<&str> {
    let (lists, scalars): (Vec<_>, Vec<_>) = entity
        .fields()
        .iter()
        .partition(|f| matches!(f.ty, FieldType::List(_)));
    scalars
        .into_iter()
        .chain(lists)
        .map(|f| f.name.as_str())
        .collect()
}

pub fn format_records_table(entity: &EntitySchema, rows: &[Record]) -> String {
    if rows.is_empty() {
        return format!("No {} rows found.", entity.name());
    }

    let columns = columns(entity);
    let mut builder = Builder::default();
    builder.push_record(columns.iter().map(|c| c.to_string()));
    for row in rows {
        builder.push_record(columns.iter().map(|c| format_cell(row.value(c))));
    }

    let mut table = builder.build();
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));

    table.to_string()
}
