//! Database bootstrap: create the database if missing, then the shop schema and tables.

use crate::config::{ColumnInfo, TableSpec};
use crate::error::AppError;
use crate::models::shop_tables;
use crate::remote::constraints::{check_constraint_name, unique_constraint_name};
use crate::sql::{qualified_table, quoted};
use serde_json::Value;
use sqlx::ConnectOptions;
use sqlx::PgPool;
use std::str::FromStr;

/// Create `schema` and every shop table if they do not exist.
pub async fn ensure_shop_tables(pool: &PgPool, schema: &str) -> Result<(), AppError> {
    sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", quoted(schema)))
        .execute(pool)
        .await?;
    for table in shop_tables(schema) {
        let ddl = table_ddl(&table);
        tracing::debug!(sql = %ddl, "ddl");
        sqlx::query(&ddl).execute(pool).await?;
        tracing::info!(table = %table.display_name(), "table ready");
    }
    Ok(())
}

/// CREATE TABLE IF NOT EXISTS with NOT NULL, defaults, primary key, UNIQUE and CHECK constraints.
pub fn table_ddl(table: &TableSpec) -> String {
    let mut parts: Vec<String> = table.columns.iter().map(column_ddl).collect();
    parts.push(format!(
        "CONSTRAINT {} PRIMARY KEY ({})",
        quoted(&unique_constraint_name(table, &table.pk_column)),
        quoted(&table.pk_column)
    ));
    for c in table.columns.iter().filter(|c| c.unique && !c.primary_key) {
        parts.push(format!(
            "CONSTRAINT {} UNIQUE ({})",
            quoted(&unique_constraint_name(table, &c.name)),
            quoted(&c.name)
        ));
    }
    for c in table.columns.iter().filter(|c| !c.rule.is_empty()) {
        parts.push(format!(
            "CONSTRAINT {} CHECK ({})",
            quoted(&check_constraint_name(table, &c.name)),
            check_expression(c)
        ));
    }
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
        qualified_table(table),
        parts.join(",\n    ")
    )
}

fn column_ddl(c: &ColumnInfo) -> String {
    let mut s = format!("{} {}", quoted(&c.name), c.pg_type.as_sql());
    if !c.nullable {
        s.push_str(" NOT NULL");
    }
    if let Some(d) = &c.default {
        s.push_str(" DEFAULT ");
        s.push_str(&d.as_sql());
    }
    s
}

fn literal(v: &Value) -> String {
    match v {
        Value::String(s) => format!("'{}'", s.replace('\'', "''")),
        other => format!("'{}'", other.to_string().replace('\'', "''")),
    }
}

fn check_expression(c: &ColumnInfo) -> String {
    let col = quoted(&c.name);
    let mut conds = Vec::new();
    if let Some(max) = c.rule.max_length {
        conds.push(format!("char_length({}) <= {}", col, max));
    }
    if let Some(pattern) = &c.rule.pattern {
        conds.push(format!("{} ~ {}", col, literal(&Value::String(pattern.clone()))));
    }
    if let Some(allowed) = &c.rule.allowed {
        let list: Vec<String> = allowed.iter().map(literal).collect();
        conds.push(format!("{} IN ({})", col, list.join(", ")));
    }
    if let Some(min) = c.rule.minimum {
        conds.push(format!("{} >= {}", col, min));
    }
    conds.join(" AND ")
}

/// Connect to the server's `postgres` database and create the target database when missing.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)
        .map_err(|e| AppError::BadRequest(format!("invalid DATABASE_URL: {}", e)))?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quoted(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

fn parse_db_name_from_url(url: &str) -> Result<(String, String), AppError> {
    let path_start = url
        .rfind('/')
        .ok_or_else(|| AppError::BadRequest("DATABASE_URL: no path".into()))?
        + 1;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let db_name = path_and_query.split('?').next().unwrap_or("").trim();
    let base = url.get(..path_start).unwrap_or(url);
    Ok((format!("{}postgres", base), db_name.to_string()))
}
