//! Detailed output: page summaries, SQL plans and entity descriptions.

use colored::Colorize;
use perps_query::{Connection, EntitySchema, ListPage, Record, SqlQuery};

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

pub fn format_page_summary(page: &Connection<Record>) -> String {
    let mut output = String::new();

    output.push_str(&format!("{}\n", "Page".cyan().bold()));
    output.push_str(&format!(
        "  Showing:       {} of {}\n",
        page.edges.len(),
        page.total_count
    ));
    output.push_str(&format!(
        "  Has next:      {}\n",
        yes_no(page.page_info.has_next_page)
    ));
    output.push_str(&format!(
        "  Has previous:  {}\n",
        yes_no(page.page_info.has_previous_page)
    ));
    if let Some(requested) = page.clamped_from {
        output.push_str(&format!("  Clamped from:  {}\n", requested));
    }
    if let Some(cursor) = &page.page_info.end_cursor {
        output.push_str(&format!("  End cursor:    {}\n", cursor));
    }

    output
}

/// Summary line for an offset list; only clamped limits are worth showing.
pub fn format_list_summary(page: &ListPage<Record>) -> Option<String> {
    page.clamped_from.map(|requested| {
        format!(
            "{}
  Showing:       {}
  Clamped from:  {}
",
            "List".cyan().bold(),
            page.rows.len(),
            requested
        )
    })
}

pub fn format_sql(query: &SqlQuery) -> String {
    let mut output = String::new();

    output.push_str(&format!("{}\n", "SQL".cyan().bold()));
    output.push_str(&format!("  {}\n", query.sql));

    if !query.params.is_empty() {
        output.push_str(&format!("\n{}\n", "Parameters".cyan().bold()));
        for (i, param) in query.params.iter().enumerate() {
            output.push_str(&format!("  ${}: {}\n", i + 1, param));
        }
    }

    output
}

pub fn format_entity_detail(entity: &EntitySchema) -> String {
    let mut output = String::new();

    output.push_str(&format!("{}\n", "=".repeat(60)));
    output.push_str(&format!("{}\n", entity.name().bold()));
    output.push_str(&format!("{}\n\n", "=".repeat(60)));

    output.push_str(&format!("{}\n", "Fields".cyan().bold()));
    for field in entity.fields() {
        let mut flags = Vec::new();
        if field.nullable {
            flags.push("nullable");
        }
        if field.unique {
            flags.push("unique");
        }
        output.push_str(&format!(
            "  {:<20} {:<22} {}\n",
            field.name,
            field.ty.to_string(),
            flags.join(", ")
        ));
    }

    if !entity.relations().is_empty() {
        output.push_str(&format!("\n{}\n", "Relations".cyan().bold()));
        for relation in entity.relations() {
            output.push_str(&format!(
                "  {:<20} -> {}.{}\n",
                relation.name, relation.target, relation.foreign_key
            ));
        }
    }

    output
}
