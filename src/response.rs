//! Standard response envelope helpers. Mutations carry the notification the
//! client should show; failures carry the message to show instead.

use crate::error::{AppError, ErrorBody, ErrorDetail};
use crate::notify::Notification;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Serialize)]
pub struct SuccessOne<T> {
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<Notification>,
}

#[derive(Serialize)]
pub struct SuccessMany<T> {
    pub data: Vec<T>,
    pub meta: MetaCount,
}

#[derive(Serialize)]
pub struct MetaCount {
    pub count: u64,
}

pub fn success_one<T: Serialize>(status: StatusCode, data: T, notification: Option<Notification>) -> (StatusCode, Json<SuccessOne<T>>) {
    (status, Json(SuccessOne { data, notification }))
}

pub fn success_many<T: Serialize>(data: Vec<T>) -> (StatusCode, Json<SuccessMany<T>>) {
    let count = data.len() as u64;
    (
        StatusCode::OK,
        Json(SuccessMany {
            data,
            meta: MetaCount { count },
        }),
    )
}

/// Failed resource operation: the service's own message when it gave one, else the resource's fallback.
pub struct OperationError {
    pub error: AppError,
    pub fallback: &'static str,
}

impl OperationError {
    pub fn new(error: AppError, fallback: &'static str) -> Self {
        OperationError { error, fallback }
    }
}

impl IntoResponse for OperationError {
    fn into_response(self) -> Response {
        let (status, code) = self.error.status_and_code();
        if status.is_server_error() {
            tracing::error!(error = %self.error, "operation failed");
        } else {
            tracing::debug!(error = %self.error, "operation rejected");
        }
        let message = match &self.error {
            AppError::NotFound(_)
            | AppError::BadRequest(_)
            | AppError::PayloadTooLarge(_)
            | AppError::InvalidBody(_) => self.error.to_string(),
            other => other.service_message().unwrap_or(self.fallback).to_string(),
        };
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };
        (status, Json(body)).into_response()
    }
}
