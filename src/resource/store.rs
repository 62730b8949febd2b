//! Result-returning data access for one resource. No notifications, no local state.

use super::Resource;
use crate::config::{TableSpec, ACTIVE_COLUMN};
use crate::error::{AppError, RemoteError};
use crate::remote::{Filter, RemoteDataService, Row};
use serde::Serialize;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;
use uuid::Uuid;

pub struct ResourceStore<R: Resource> {
    service: Arc<dyn RemoteDataService>,
    table: Arc<TableSpec>,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource> Clone for ResourceStore<R> {
    fn clone(&self) -> Self {
        ResourceStore {
            service: self.service.clone(),
            table: self.table.clone(),
            _resource: PhantomData,
        }
    }
}

impl<R: Resource> ResourceStore<R> {
    pub fn new(service: Arc<dyn RemoteDataService>, schema: &str) -> Self {
        ResourceStore {
            service,
            table: Arc::new(R::table_spec(schema)),
            _resource: PhantomData,
        }
    }

    pub fn table(&self) -> &TableSpec {
        &self.table
    }

    /// All rows with `is_active = true`, in the table's list order. No rows is an empty vec.
    pub async fn list_active(&self) -> Result<Vec<R::Record>, AppError> {
        let filter = Filter::new()
            .eq(ACTIVE_COLUMN, true)
            .order_by(&self.table.order_column);
        self.select(&filter).await
    }

    /// Active rows whose `column` equals `value`.
    pub async fn find_active_by(&self, column: &str, value: impl Into<Value>) -> Result<Vec<R::Record>, AppError> {
        let filter = Filter::new()
            .eq(column, value)
            .eq(ACTIVE_COLUMN, true)
            .order_by(&self.table.order_column);
        self.select(&filter).await
    }

    /// One record by id, active or not.
    pub async fn fetch(&self, id: Uuid) -> Result<Option<R::Record>, AppError> {
        let filter = Filter::new().eq(&self.table.pk_column, id.to_string());
        Ok(self.select(&filter).await?.into_iter().next())
    }

    pub async fn insert(&self, new: &R::New) -> Result<R::Record, AppError> {
        let row = to_row(new)?;
        let created = self
            .service
            .insert(&self.table, row)
            .await
            .into_result()?
            .ok_or_else(|| RemoteError::malformed(format!("insert into {} returned no row", self.table.display_name())))?;
        self.decode(created)
    }

    /// Partial update of the row with `id`. Matching no row is not an error.
    pub async fn update(&self, id: Uuid, patch: &R::Patch) -> Result<(), AppError> {
        let row = to_row(patch)?;
        self.update_row(id, row).await
    }

    /// Soft delete: `is_active = false`. The row stays in the table.
    pub async fn deactivate(&self, id: Uuid) -> Result<(), AppError> {
        let mut row = Row::new();
        row.insert(ACTIVE_COLUMN.to_string(), Value::Bool(false));
        self.update_row(id, row).await
    }

    async fn update_row(&self, id: Uuid, row: Row) -> Result<(), AppError> {
        let filter = Filter::new().eq(&self.table.pk_column, id.to_string());
        self.service
            .update(&self.table, &filter, row)
            .await
            .into_result()?;
        Ok(())
    }

    async fn select(&self, filter: &Filter) -> Result<Vec<R::Record>, AppError> {
        let rows = self
            .service
            .select(&self.table, filter)
            .await
            .into_result()?
            .unwrap_or_default();
        rows.into_iter().map(|r| self.decode(r)).collect()
    }

    fn decode(&self, row: Row) -> Result<R::Record, AppError> {
        serde_json::from_value(Value::Object(row))
            .map_err(|e| AppError::Decode(format!("{} row: {}", self.table.display_name(), e)))
    }
}

fn to_row<T: Serialize>(value: &T) -> Result<Row, AppError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(AppError::BadRequest(format!("expected an object payload, got {}", other))),
    }
}
