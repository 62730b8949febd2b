//! Builds parameterized SELECT, INSERT and UPDATE statements from a table spec.

use crate::config::{ColumnInfo, TableSpec, UPDATED_AT_COLUMN};
use crate::error::RemoteError;
use crate::remote::{Filter, Row};
use serde_json::Value;

/// Quote identifier for PostgreSQL (safe: only from table specs).
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Full qualified table name.
pub fn qualified_table(table: &TableSpec) -> String {
    format!("{}.{}", quoted(&table.schema_name), quoted(&table.table_name))
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    /// Push a value and return its cast placeholder, e.g. `$2::uuid`.
    fn push_param(&mut self, column: &ColumnInfo, v: Value) -> String {
        self.params.push(v);
        format!("${}::{}", self.params.len(), column.pg_type.as_sql())
    }
}

fn select_column_list(table: &TableSpec) -> String {
    table
        .columns
        .iter()
        .map(|c| quoted(&c.name))
        .collect::<Vec<_>>()
        .join(", ")
}

fn known_column<'a>(table: &'a TableSpec, name: &str) -> Result<&'a ColumnInfo, RemoteError> {
    table.column_info(name).ok_or_else(|| {
        RemoteError::invalid_request(format!(
            "column '{}' does not exist on {}",
            name,
            table.display_name()
        ))
    })
}

fn where_clause(q: &mut QueryBuf, table: &TableSpec, filter: &Filter) -> Result<String, RemoteError> {
    let mut parts = Vec::with_capacity(filter.conditions.len());
    for (col, val) in &filter.conditions {
        let info = known_column(table, col)?;
        if val.is_null() {
            parts.push(format!("{} IS NULL", quoted(col)));
        } else {
            let ph = q.push_param(info, val.clone());
            parts.push(format!("{} = {}", quoted(col), ph));
        }
    }
    Ok(if parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", parts.join(" AND "))
    })
}

/// SELECT with exact-match filters, ORDER BY the filter's column (or the primary key).
pub fn select_where(table: &TableSpec, filter: &Filter) -> Result<QueryBuf, RemoteError> {
    let mut q = QueryBuf::new();
    let where_sql = where_clause(&mut q, table, filter)?;
    let order = match &filter.order_by {
        Some(col) => known_column(table, col)?.name.as_str(),
        None => table.pk_column.as_str(),
    };
    q.sql = format!(
        "SELECT {} FROM {}{} ORDER BY {}",
        select_column_list(table),
        qualified_table(table),
        where_sql,
        quoted(order)
    );
    Ok(q)
}

/// INSERT one row. Columns the row omits are left to their DB default; columns without a
/// default are bound as NULL so the database enforces NOT NULL itself.
pub fn insert(table: &TableSpec, row: &Row) -> Result<QueryBuf, RemoteError> {
    for key in row.keys() {
        known_column(table, key)?;
    }
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for c in &table.columns {
        let val = row.get(&c.name).cloned();
        if val.is_none() && c.default.is_some() {
            continue;
        }
        let ph = q.push_param(c, val.unwrap_or(Value::Null));
        cols.push(quoted(&c.name));
        placeholders.push(ph);
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        qualified_table(table),
        cols.join(", "),
        placeholders.join(", "),
        select_column_list(table)
    );
    Ok(q)
}

/// UPDATE rows matching `filter`: SET only the columns present in `patch`, bump `updated_at`.
/// An empty filter is refused so a patch never reaches the whole table.
pub fn update_where(table: &TableSpec, filter: &Filter, patch: &Row) -> Result<QueryBuf, RemoteError> {
    if filter.is_empty() {
        return Err(RemoteError::invalid_request("update requires a filter"));
    }
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    for (k, v) in patch {
        let info = known_column(table, k)?;
        if info.primary_key {
            continue;
        }
        let ph = q.push_param(info, v.clone());
        sets.push(format!("{} = {}", quoted(k), ph));
    }
    if table.has_column(UPDATED_AT_COLUMN) && !patch.contains_key(UPDATED_AT_COLUMN) {
        sets.push(format!("{} = NOW()", quoted(UPDATED_AT_COLUMN)));
    }
    if sets.is_empty() {
        return Err(RemoteError::invalid_request("update has no columns to set"));
    }
    let where_sql = where_clause(&mut q, table, filter)?;
    q.sql = format!("UPDATE {} SET {}{}", qualified_table(table), sets.join(", "), where_sql);
    Ok(q)
}
