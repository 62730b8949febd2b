//! In-process remote data service. Keeps rows per table and enforces the same
//! server-side rules the database would, so callers see realistic failures.

use super::constraints::ConstraintChecker;
use super::{Filter, RemoteDataService, Reply, Row};
use crate::config::{TableSpec, UPDATED_AT_COLUMN};
use crate::error::RemoteError;
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
pub struct MemoryDataService {
    tables: Mutex<HashMap<String, Vec<Row>>>,
    /// Errors returned, in order, by the next calls instead of touching the tables.
    injected: Mutex<VecDeque<RemoteError>>,
}

impl MemoryDataService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next call fail with `error` (queued; one error per call).
    pub fn fail_next(&self, error: RemoteError) {
        lock(&self.injected).push_back(error);
    }

    /// Every stored row of `table`, active or not.
    pub fn rows(&self, table: &TableSpec) -> Vec<Row> {
        lock(&self.tables)
            .get(&table.display_name())
            .cloned()
            .unwrap_or_default()
    }

    fn take_injected(&self) -> Option<RemoteError> {
        lock(&self.injected).pop_front()
    }

    fn check_filter(table: &TableSpec, filter: &Filter) -> Result<(), RemoteError> {
        let columns = filter
            .conditions
            .iter()
            .map(|(c, _)| c)
            .chain(filter.order_by.iter());
        for col in columns {
            if !table.has_column(col) {
                return Err(RemoteError::invalid_request(format!(
                    "column \"{}\" of relation \"{}\" does not exist",
                    col, table.table_name
                ))
                .with_code("42703"));
            }
        }
        Ok(())
    }

    fn do_select(&self, table: &TableSpec, filter: &Filter) -> Result<Vec<Row>, RemoteError> {
        Self::check_filter(table, filter)?;
        let tables = lock(&self.tables);
        let mut rows: Vec<Row> = tables
            .get(&table.display_name())
            .map(|rows| rows.iter().filter(|r| filter.matches(r)).cloned().collect())
            .unwrap_or_default();
        let order = filter.order_by.as_deref().unwrap_or(&table.pk_column);
        rows.sort_by(|a, b| {
            compare_values(
                a.get(order).unwrap_or(&Value::Null),
                b.get(order).unwrap_or(&Value::Null),
            )
        });
        Ok(rows)
    }

    fn do_insert(&self, table: &TableSpec, mut record: Row) -> Result<Row, RemoteError> {
        ConstraintChecker::check_columns(table, &record)?;
        for col in &table.columns {
            if record.get(&col.name).is_none() {
                let v = col.default.as_ref().map(|d| d.generate()).unwrap_or(Value::Null);
                record.insert(col.name.clone(), v);
            }
        }
        let mut tables = lock(&self.tables);
        let rows = tables.entry(table.display_name()).or_default();
        ConstraintChecker::check_row(table, &record, rows.iter())?;
        rows.push(record.clone());
        Ok(record)
    }

    fn do_update(&self, table: &TableSpec, filter: &Filter, patch: Row) -> Result<usize, RemoteError> {
        if filter.is_empty() {
            return Err(RemoteError::invalid_request("update requires a filter"));
        }
        Self::check_filter(table, filter)?;
        ConstraintChecker::check_columns(table, &patch)?;
        let now = Value::String(chrono::Utc::now().to_rfc3339());

        let mut tables = lock(&self.tables);
        let rows = tables.entry(table.display_name()).or_default();
        let mut updated: Vec<(usize, Row)> = Vec::new();
        for (idx, row) in rows.iter().enumerate() {
            if !filter.matches(row) {
                continue;
            }
            let mut next = row.clone();
            for (k, v) in &patch {
                if *k != table.pk_column {
                    next.insert(k.clone(), v.clone());
                }
            }
            if table.has_column(UPDATED_AT_COLUMN) && !patch.contains_key(UPDATED_AT_COLUMN) {
                next.insert(UPDATED_AT_COLUMN.to_string(), now.clone());
            }
            let others = rows.iter().enumerate().filter(move |(i, _)| *i != idx).map(|(_, r)| r);
            ConstraintChecker::check_row(table, &next, others)?;
            updated.push((idx, next));
        }
        let count = updated.len();
        for (idx, next) in updated {
            if let Some(slot) = rows.get_mut(idx) {
                *slot = next;
            }
        }
        Ok(count)
    }
}

#[async_trait]
impl RemoteDataService for MemoryDataService {
    async fn select(&self, table: &TableSpec, filter: &Filter) -> Reply<Vec<Row>> {
        if let Some(e) = self.take_injected() {
            return Reply::err(e);
        }
        match self.do_select(table, filter) {
            Ok(rows) if rows.is_empty() => Reply::empty(),
            other => Reply::from_result(other),
        }
    }

    async fn insert(&self, table: &TableSpec, record: Row) -> Reply<Row> {
        if let Some(e) = self.take_injected() {
            return Reply::err(e);
        }
        Reply::from_result(self.do_insert(table, record))
    }

    async fn update(&self, table: &TableSpec, filter: &Filter, patch: Row) -> Reply<()> {
        if let Some(e) = self.take_injected() {
            return Reply::err(e);
        }
        match self.do_update(table, filter, patch) {
            Ok(count) => {
                tracing::debug!(table = %table.display_name(), count, "memory update applied");
                Reply::ok(())
            }
            Err(e) => Reply::err(e),
        }
    }

    async fn ping(&self) -> Reply<()> {
        match self.take_injected() {
            Some(e) => Reply::err(e),
            None => Reply::ok(()),
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}
