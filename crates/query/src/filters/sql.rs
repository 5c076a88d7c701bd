//! SQL pushdown: renders compiled filters and fetch plans as parameterised
//! PostgreSQL with `$n` placeholders.
//!
//! The rendering keeps the in-memory semantics: null fields fail every
//! condition except `isNull`, relation checks become correlated `EXISTS`
//! sub-queries, and the resume point becomes a keyset condition that honours
//! each key's direction and null placement.
//!
//! In-memory evaluation is two-valued, so a negated condition that SQL would
//! evaluate to NULL must count as true: negation renders as `(...) IS NOT TRUE`.
//! `EXISTS` is never NULL and keeps the plain `NOT EXISTS` form.

use std::fmt::Write as _;

use crate::filters::compiler::CompiledFilter;
use crate::filters::operators::{ArrayOp, CompareOp, Condition, TextOp};
use crate::order::{CompiledOrder, SortKey};
use crate::store::FetchPlan;
use crate::types::ordering::OrderDirection;
use crate::types::schema::EntitySchema;
use crate::types::value::Value;

/// A rendered statement or fragment with its bind parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

#[derive(Default)]
struct SqlBuilder {
    sql: String,
    params: Vec<Value>,
    aliases: usize,
}

impl SqlBuilder {
    fn push(&mut self, sql: &str) {
        self.sql.push_str(sql);
    }

    fn param(&mut self, value: Value) {
        let numeric = matches!(value, Value::BigInt(_) | Value::BigDecimal(_));
        self.params.push(value);
        let _ = write!(self.sql, "${}", self.params.len());
        if numeric {
            self.push("::numeric");
        }
    }

    fn next_alias(&mut self) -> String {
        let alias = format!("t{}", self.aliases);
        self.aliases += 1;
        alias
    }

    fn finish(self) -> SqlQuery {
        SqlQuery {
            sql: self.sql,
            params: self.params,
        }
    }
}

fn ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn column(alias: &str, field: &str) -> String {
    format!("{}.{}", ident(alias), ident(field))
}

/// Escape LIKE wildcards so the needle matches literally.
fn like_escape(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn render_filter(filter: &CompiledFilter, alias: &str, b: &mut SqlBuilder) {
    match filter {
        CompiledFilter::All(children) => render_junction(children, " AND ", "TRUE", alias, b),
        CompiledFilter::Any(children) => render_junction(children, " OR ", "FALSE", alias, b),
        CompiledFilter::Not(inner) => match inner.as_ref() {
            CompiledFilter::Exists { .. } => {
                b.push("NOT ");
                render_filter(inner, alias, b);
            }
            _ => {
                b.push("(");
                render_filter(inner, alias, b);
                b.push(") IS NOT TRUE");
            }
        },
        CompiledFilter::Field { field, condition } => {
            render_condition(&column(alias, field), condition, b);
        }
        CompiledFilter::Exists { relation, filter } => {
            let inner = b.next_alias();
            b.push(&format!(
                "EXISTS (SELECT 1 FROM {} AS {} WHERE {} = {} AND ",
                ident(&relation.target),
                ident(&inner),
                column(&inner, &relation.foreign_key),
                column(alias, EntitySchema::ID_FIELD),
            ));
            render_filter(filter, &inner, b);
            b.push(")");
        }
        CompiledFilter::After { order, tuple } => render_after(order, tuple, alias, b),
    }
}

fn render_junction(
    children: &[CompiledFilter],
    separator: &str,
    empty: &str,
    alias: &str,
    b: &mut SqlBuilder,
) {
    match children {
        [] => b.push(empty),
        [only] => render_filter(only, alias, b),
        _ => {
            b.push("(");
            for (i, child) in children.iter().enumerate() {
                if i > 0 {
                    b.push(separator);
                }
                render_filter(child, alias, b);
            }
            b.push(")");
        }
    }
}

fn render_condition(col: &str, condition: &Condition, b: &mut SqlBuilder) {
    match condition {
        Condition::IsNull(true) => b.push(&format!("{col} IS NULL")),
        Condition::IsNull(false) => b.push(&format!("{col} IS NOT NULL")),
        Condition::Compare { op, operand } => {
            b.push(&format!("{col} {} ", op.sql()));
            b.param(operand.clone());
        }
        Condition::In { negated, values } if values.is_empty() => {
            if *negated {
                b.push(&format!("{col} IS NOT NULL"));
            } else {
                b.push("FALSE");
            }
        }
        Condition::In { negated, values } => {
            b.push(col);
            b.push(if *negated { " NOT IN (" } else { " IN (" });
            for (i, value) in values.iter().enumerate() {
                if i > 0 {
                    b.push(", ");
                }
                b.param(value.clone());
            }
            b.push(")");
        }
        Condition::Text { op, negated, needle } => {
            let escaped = like_escape(needle);
            let (keyword, pattern) = match op {
                TextOp::Contains => ("LIKE", format!("%{escaped}%")),
                TextOp::ContainsInsensitive => ("ILIKE", format!("%{escaped}%")),
                TextOp::StartsWith => ("LIKE", format!("{escaped}%")),
                TextOp::EndsWith => ("LIKE", format!("%{escaped}")),
            };
            if *negated {
                b.push("NOT (");
            }
            b.push(&format!("{col} {keyword} "));
            b.param(Value::String(pattern));
            if *negated {
                b.push(")");
            }
        }
        Condition::Array { op, values } => {
            let list = Value::List(values.clone());
            match op {
                ArrayOp::All => {
                    b.push(&format!("{col} @> "));
                    b.param(list);
                }
                ArrayOp::Any => {
                    b.push(&format!("{col} && "));
                    b.param(list);
                }
                ArrayOp::None => {
                    b.push(&format!("NOT ({col} && "));
                    b.param(list);
                    b.push(")");
                }
            }
        }
    }
}

/// Keyset condition: some key `i` sorts strictly after `tuple[i]` while all
/// earlier keys are equal.
fn render_after(order: &CompiledOrder, tuple: &[Value], alias: &str, b: &mut SqlBuilder) {
    let mut disjuncts = 0;
    b.push("(");
    for (i, (key, value)) in order.keys().iter().zip(tuple).enumerate() {
        if value.is_null() && !key.nulls_first {
            // Nothing sorts after a null placed last on this key.
            continue;
        }
        if disjuncts > 0 {
            b.push(" OR ");
        }
        disjuncts += 1;
        b.push("(");
        for (prev, prev_value) in order.keys().iter().zip(tuple).take(i) {
            render_key_equal(&column(alias, &prev.field), prev_value, b);
            b.push(" AND ");
        }
        render_key_after(&column(alias, &key.field), key, value, b);
        b.push(")");
    }
    if disjuncts == 0 {
        b.push("FALSE");
    }
    b.push(")");
}

fn render_key_equal(col: &str, value: &Value, b: &mut SqlBuilder) {
    if value.is_null() {
        b.push(&format!("{col} IS NULL"));
    } else {
        b.push(&format!("{col} = "));
        b.param(value.clone());
    }
}

fn render_key_after(col: &str, key: &SortKey, value: &Value, b: &mut SqlBuilder) {
    if value.is_null() {
        b.push(&format!("{col} IS NOT NULL"));
        return;
    }
    let op = match key.direction {
        OrderDirection::Asc => CompareOp::Gt,
        OrderDirection::Desc => CompareOp::Lt,
    };
    if key.nulls_first || !key.nullable {
        b.push(&format!("{col} {} ", op.sql()));
        b.param(value.clone());
    } else {
        b.push(&format!("({col} {} ", op.sql()));
        b.param(value.clone());
        b.push(&format!(" OR {col} IS NULL)"));
    }
}

fn render_order_by(order: &CompiledOrder, alias: &str, b: &mut SqlBuilder) {
    b.push(" ORDER BY ");
    for (i, key) in order.keys().iter().enumerate() {
        if i > 0 {
            b.push(", ");
        }
        b.push(&format!(
            "{} {} NULLS {}",
            column(alias, &key.field),
            key.direction.token(),
            if key.nulls_first { "FIRST" } else { "LAST" }
        ));
    }
}

/// Render a filter as a `WHERE` fragment for rows aliased `t0`.
pub fn render_where(filter: &CompiledFilter) -> SqlQuery {
    let mut b = SqlBuilder::default();
    let alias = b.next_alias();
    render_filter(filter, &alias, &mut b);
    b.finish()
}

/// Render a `SELECT count(*)` for an entity and filter.
pub fn render_count(entity: &str, filter: &CompiledFilter) -> SqlQuery {
    let mut b = SqlBuilder::default();
    let alias = b.next_alias();
    b.push(&format!(
        "SELECT count(*) FROM {} AS {} WHERE ",
        ident(entity),
        ident(&alias)
    ));
    render_filter(filter, &alias, &mut b);
    b.finish()
}

impl FetchPlan {
    /// Render the plan as a single `SELECT`.
    pub fn to_sql(&self) -> SqlQuery {
        let mut b = SqlBuilder::default();
        let alias = b.next_alias();
        b.push(&format!(
            "SELECT {}.* FROM {} AS {} WHERE ",
            ident(&alias),
            ident(&self.entity),
            ident(&alias)
        ));
        render_filter(&self.filter, &alias, &mut b);
        render_order_by(&self.order, &alias, &mut b);
        if let Some(limit) = self.limit {
            b.push(&format!(" LIMIT {limit}"));
        }
        if self.offset > 0 {
            b.push(&format!(" OFFSET {}", self.offset));
        }
        b.finish()
    }
}
