//! PostgreSQL-backed remote data service.

use super::{Filter, RemoteDataService, Reply, Row};
use crate::config::TableSpec;
use crate::error::RemoteError;
use crate::sql::{insert, select_where, update_where, QueryBuf, TextBind};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;

#[derive(Clone)]
pub struct PgDataService {
    pool: PgPool,
}

impl PgDataService {
    pub fn new(pool: PgPool) -> Self {
        PgDataService { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn query_many(&self, q: &QueryBuf) -> Result<Vec<Row>, RemoteError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(TextBind::from_json(p));
        }
        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.iter().map(row_to_json).collect())
    }

    async fn fetch_returning_one(&self, q: &QueryBuf) -> Result<Option<Row>, RemoteError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(TextBind::from_json(p));
        }
        let row = query.fetch_optional(&self.pool).await?;
        Ok(row.map(|r| row_to_json(&r)))
    }

    async fn execute(&self, q: &QueryBuf) -> Result<u64, RemoteError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "execute");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(TextBind::from_json(p));
        }
        let done = query.execute(&self.pool).await?;
        Ok(done.rows_affected())
    }
}

#[async_trait]
impl RemoteDataService for PgDataService {
    async fn select(&self, table: &TableSpec, filter: &Filter) -> Reply<Vec<Row>> {
        let result = match select_where(table, filter) {
            Ok(q) => self.query_many(&q).await,
            Err(e) => Err(e),
        };
        Reply::from_result(result)
    }

    async fn insert(&self, table: &TableSpec, record: Row) -> Reply<Row> {
        let q = match insert(table, &record) {
            Ok(q) => q,
            Err(e) => return Reply::err(e),
        };
        match self.fetch_returning_one(&q).await {
            Ok(Some(row)) => Reply::ok(row),
            Ok(None) => Reply::empty(),
            Err(e) => Reply::err(e),
        }
    }

    async fn update(&self, table: &TableSpec, filter: &Filter, patch: Row) -> Reply<()> {
        let q = match update_where(table, filter, &patch) {
            Ok(q) => q,
            Err(e) => return Reply::err(e),
        };
        match self.execute(&q).await {
            Ok(affected) => {
                tracing::debug!(table = %table.display_name(), affected, "update applied");
                Reply::ok(())
            }
            Err(e) => Reply::err(e),
        }
    }

    async fn ping(&self) -> Reply<()> {
        match sqlx::query("SELECT 1").fetch_optional(&self.pool).await {
            Ok(_) => Reply::ok(()),
            Err(e) => Reply::err(e.into()),
        }
    }
}

fn row_to_json(row: &sqlx::postgres::PgRow) -> Row {
    use sqlx::Column;
    use sqlx::Row as _;
    let mut map = Row::new();
    for col in row.columns() {
        let name = col.name();
        map.insert(name.to_string(), cell_to_value(row, name));
    }
    map
}

fn cell_to_value(row: &sqlx::postgres::PgRow, name: &str) -> Value {
    use sqlx::Row as _;
    if let Ok(Some(n)) = row.try_get::<Option<i32>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(name) {
        return Value::Bool(b);
    }
    if let Ok(Some(u)) = row.try_get::<Option<uuid::Uuid>, _>(name) {
        return Value::String(u.to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name) {
        return Value::String(d.to_rfc3339());
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(name) {
        return Value::String(s);
    }
    if let Ok(Some(j)) = row.try_get::<Option<serde_json::Value>, _>(name) {
        return j;
    }
    Value::Null
}
