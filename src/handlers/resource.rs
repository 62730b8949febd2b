//! Resource CRUD handlers, generic over the shop resources.
//! Each handler calls the store and renders the outcome with the resource's notification texts.

use crate::error::AppError;
use crate::models::{Product, Products};
use crate::notify::Notification;
use crate::resource::Resource;
use crate::response::{success_many, success_one, OperationError};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

fn parse_id(id_str: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id_str).map_err(|_| AppError::BadRequest("invalid uuid".into()))
}

#[derive(Serialize)]
pub struct Removed {
    pub id: Uuid,
}

pub async fn list<R: Resource>(State(state): State<AppState>) -> Result<impl IntoResponse, OperationError> {
    let rows = state
        .store::<R>()
        .list_active()
        .await
        .map_err(|e| OperationError::new(e, R::MESSAGES.load_failed))?;
    Ok(success_many(rows))
}

pub async fn read<R: Resource>(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, OperationError> {
    let fail = |e: AppError| OperationError::new(e, R::MESSAGES.load_failed);
    let id = parse_id(&id_str).map_err(fail)?;
    let store = state.store::<R>();
    let pk = store.table().pk_column.clone();
    let row = store
        .find_active_by(&pk, id.to_string())
        .await
        .map_err(fail)?
        .into_iter()
        .next()
        .ok_or_else(|| fail(AppError::NotFound(id_str)))?;
    Ok(success_one(StatusCode::OK, row, None))
}

pub async fn create<R: Resource>(
    State(state): State<AppState>,
    body: Result<Json<R::New>, JsonRejection>,
) -> Result<impl IntoResponse, OperationError> {
    let fail = |e: AppError| OperationError::new(e, R::MESSAGES.create_failed);
    let Json(body) = body.map_err(|e| fail(e.into()))?;
    let row = state.store::<R>().insert(&body).await.map_err(fail)?;
    tracing::info!(resource = R::PATH, id = %R::id(&row), "created");
    Ok(success_one(StatusCode::CREATED, row, Some(Notification::success(R::MESSAGES.created))))
}

/// Partial update of an active record. Removed records are 404, as for `read`.
pub async fn update<R: Resource>(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    patch: Result<Json<R::Patch>, JsonRejection>,
) -> Result<impl IntoResponse, OperationError> {
    let fail = |e: AppError| OperationError::new(e, R::MESSAGES.update_failed);
    let id = parse_id(&id_str).map_err(fail)?;
    let Json(patch) = patch.map_err(|e| fail(e.into()))?;
    let store = state.store::<R>();
    let pk = store.table().pk_column.clone();
    if store.find_active_by(&pk, id.to_string()).await.map_err(fail)?.is_empty() {
        return Err(fail(AppError::NotFound(id_str)));
    }
    store.update(id, &patch).await.map_err(fail)?;
    let row = store
        .fetch(id)
        .await
        .map_err(fail)?
        .ok_or_else(|| fail(AppError::NotFound(id_str)))?;
    Ok(success_one(StatusCode::OK, row, Some(Notification::success(R::MESSAGES.updated))))
}

/// Soft delete. Repeating it on the same id succeeds again.
pub async fn remove<R: Resource>(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, OperationError> {
    let fail = |e: AppError| OperationError::new(e, R::MESSAGES.remove_failed);
    let id = parse_id(&id_str).map_err(fail)?;
    state.store::<R>().deactivate(id).await.map_err(fail)?;
    tracing::info!(resource = R::PATH, id = %id, "deactivated");
    Ok(success_one(StatusCode::OK, Removed { id }, Some(Notification::success(R::MESSAGES.removed))))
}

pub async fn product_by_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, OperationError> {
    let fail = |e: AppError| OperationError::new(e, Products::MESSAGES.load_failed);
    let product = state
        .store::<Products>()
        .find_by_code(&code)
        .await
        .map_err(fail)?
        .ok_or_else(|| fail(AppError::NotFound(code)))?;
    Ok(success_one(StatusCode::OK, product, None))
}

pub async fn products_to_restock(State(state): State<AppState>) -> Result<impl IntoResponse, OperationError> {
    let rows: Vec<Product> = state
        .store::<Products>()
        .restock_list()
        .await
        .map_err(|e| OperationError::new(e, Products::MESSAGES.load_failed))?;
    Ok(success_many(rows))
}
