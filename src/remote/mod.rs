//! Remote data service boundary: the hosted relational database as seen by the shop.
//!
//! Every call answers with a [`Reply`], a two-shaped value carrying data or an
//! error. Callers turn it into a `Result` right after the call with
//! [`Reply::into_result`], so a non-null error is raised immediately.

pub mod constraints;
mod memory;
mod postgres;

pub use constraints::ConstraintChecker;
pub use memory::MemoryDataService;
pub use postgres::PgDataService;

use crate::config::TableSpec;
use crate::error::RemoteError;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// One row as column name -> JSON value.
pub type Row = Map<String, Value>;

/// Conjunction of column equalities plus an optional ordering column.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Filter {
    pub conditions: Vec<(String, Value)>,
    pub order_by: Option<String>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.conditions.push((column.to_string(), value.into()));
        self
    }

    pub fn order_by(mut self, column: &str) -> Self {
        self.order_by = Some(column.to_string());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// True when every condition holds for `row`. Missing columns compare as null.
    pub fn matches(&self, row: &Row) -> bool {
        self.conditions
            .iter()
            .all(|(col, val)| value_eq(row.get(col).unwrap_or(&Value::Null), val))
    }
}

pub(crate) fn value_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::String(s), Value::String(t)) => s == t,
        (Value::Number(n), Value::Number(m)) => n.as_f64() == m.as_f64(),
        _ => a == b,
    }
}

/// Data-or-error result of a remote call. Both sides may be empty (no rows, no error).
#[derive(Debug, Clone, PartialEq)]
pub struct Reply<T> {
    pub data: Option<T>,
    pub error: Option<RemoteError>,
}

impl<T> Reply<T> {
    pub fn ok(data: T) -> Self {
        Reply {
            data: Some(data),
            error: None,
        }
    }

    pub fn empty() -> Self {
        Reply { data: None, error: None }
    }

    pub fn err(error: RemoteError) -> Self {
        Reply {
            data: None,
            error: Some(error),
        }
    }

    pub fn from_result(result: Result<T, RemoteError>) -> Self {
        match result {
            Ok(v) => Self::ok(v),
            Err(e) => Self::err(e),
        }
    }

    /// Raise a non-null error; otherwise hand back the (possibly absent) data.
    pub fn into_result(self) -> Result<Option<T>, RemoteError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.data),
        }
    }
}

#[async_trait]
pub trait RemoteDataService: Send + Sync {
    /// Rows matching `filter`, ordered by `filter.order_by` or the table's primary key.
    async fn select(&self, table: &TableSpec, filter: &Filter) -> Reply<Vec<Row>>;

    /// Insert one row; the service assigns defaults (id, timestamps) and returns the stored row.
    async fn insert(&self, table: &TableSpec, record: Row) -> Reply<Row>;

    /// Apply `patch` to every row matching `filter`. Matching zero rows is not an error.
    async fn update(&self, table: &TableSpec, filter: &Filter, patch: Row) -> Reply<()>;

    /// Cheap round trip used by readiness checks.
    async fn ping(&self) -> Reply<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn into_result_raises_error_side() {
        let reply: Reply<Vec<Row>> = Reply::err(RemoteError::network("offline"));
        assert_eq!(reply.into_result().unwrap_err().message, "offline");
        let empty: Reply<Vec<Row>> = Reply::empty();
        assert_eq!(empty.into_result().unwrap(), None);
    }

    #[test]
    fn filter_matches_all_conditions() {
        let mut row = Row::new();
        row.insert("is_active".into(), json!(true));
        row.insert("estoque".into(), json!(3));
        assert!(Filter::new().eq("is_active", true).eq("estoque", 3.0).matches(&row));
        assert!(!Filter::new().eq("is_active", false).matches(&row));
        assert!(!Filter::new().eq("missing", "x").matches(&row));
        assert!(Filter::new().matches(&row));
    }
}
