//! Typed errors and HTTP mapping.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing variable: {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Failure category reported by the remote data service.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemoteErrorKind {
    Network,
    Unauthorized,
    Constraint,
    Conflict,
    InvalidRequest,
    Malformed,
    Internal,
}

/// Error value returned by the remote data service alongside (instead of) data.
#[derive(Error, Clone, Debug, PartialEq)]
#[error("{message}")]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    /// Service-specific code (SQLSTATE for PostgreSQL).
    pub code: Option<String>,
    pub message: String,
}

impl RemoteError {
    pub fn new(kind: RemoteErrorKind, message: impl Into<String>) -> Self {
        RemoteError {
            kind,
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Network, message)
    }

    pub fn constraint(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Constraint, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Conflict, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::InvalidRequest, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Malformed, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Internal, message)
    }
}

impl From<sqlx::Error> for RemoteError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) => {
                let code = db.code().map(|c| c.into_owned());
                let kind = match code.as_deref() {
                    Some("23502") | Some("23514") | Some("23503") | Some("22001") => RemoteErrorKind::Constraint,
                    Some("23505") => RemoteErrorKind::Conflict,
                    Some("42501") => RemoteErrorKind::Unauthorized,
                    Some(c) if c.starts_with("22") || c.starts_with("42") => RemoteErrorKind::InvalidRequest,
                    _ => RemoteErrorKind::Internal,
                };
                RemoteError {
                    kind,
                    code,
                    message: db.message().to_string(),
                }
            }
            sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Tls(_) => {
                RemoteError::network(e.to_string())
            }
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) | sqlx::Error::ColumnNotFound(_) => {
                RemoteError::malformed(e.to_string())
            }
            _ => RemoteError::internal(e.to_string()),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error("decode: {0}")]
    Decode(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("request body exceeds {0} bytes")]
    PayloadTooLarge(usize),
    #[error(transparent)]
    InvalidBody(#[from] JsonRejection),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
}

impl AppError {
    /// Message reported by the remote service, if this error came from it.
    pub fn service_message(&self) -> Option<&str> {
        match self {
            AppError::Remote(e) if !e.message.is_empty() => Some(e.message.as_str()),
            _ => None,
        }
    }

    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            AppError::Remote(e) => match e.kind {
                RemoteErrorKind::Network => (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable"),
                RemoteErrorKind::Unauthorized => (StatusCode::FORBIDDEN, "forbidden"),
                RemoteErrorKind::Constraint => (StatusCode::UNPROCESSABLE_ENTITY, "constraint_violation"),
                RemoteErrorKind::Conflict => (StatusCode::CONFLICT, "conflict"),
                RemoteErrorKind::InvalidRequest => (StatusCode::BAD_REQUEST, "bad_request"),
                RemoteErrorKind::Malformed | RemoteErrorKind::Internal => {
                    (StatusCode::BAD_GATEWAY, "service_error")
                }
            },
            AppError::Decode(_) => (StatusCode::BAD_GATEWAY, "decode_error"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large"),
            AppError::InvalidBody(r) if r.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large")
            }
            AppError::InvalidBody(r) => (r.status(), "invalid_body"),
            AppError::Db(e) => {
                if let sqlx::Error::RowNotFound = e {
                    (StatusCode::NOT_FOUND, "not_found")
                } else {
                    (StatusCode::INTERNAL_SERVER_ERROR, "database_error")
                }
            }
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Decode(e.to_string())
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(RemoteErrorKind::Constraint, StatusCode::UNPROCESSABLE_ENTITY)]
    #[case(RemoteErrorKind::Conflict, StatusCode::CONFLICT)]
    #[case(RemoteErrorKind::Network, StatusCode::SERVICE_UNAVAILABLE)]
    #[case(RemoteErrorKind::Malformed, StatusCode::BAD_GATEWAY)]
    fn remote_kinds_map_to_status(#[case] kind: RemoteErrorKind, #[case] expected: StatusCode) {
        let err = AppError::from(RemoteError::new(kind, "boom"));
        assert_eq!(err.status_and_code().0, expected);
    }

    #[test]
    fn service_message_only_for_remote_errors() {
        let remote = AppError::from(RemoteError::constraint("telefone is required"));
        assert_eq!(remote.service_message(), Some("telefone is required"));
        assert_eq!(AppError::NotFound("x".into()).service_message(), None);
        assert_eq!(AppError::from(RemoteError::internal("")).service_message(), None);
    }

    #[test]
    fn payload_too_large_has_its_own_code() {
        let err = AppError::PayloadTooLarge(1024);
        assert_eq!(err.status_and_code(), (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large"));
        assert_eq!(err.to_string(), "request body exceeds 1024 bytes");
    }
}
