use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{DbErr, SqlErr};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{field}: {reason}")]
    ValidationFailed { field: String, reason: String },

    #[error("{kind} with id {id} does not exist")]
    ReferenceNotFound { kind: &'static str, id: i32 },

    #[error("{kind} with id {id} not found")]
    ObjectNotFound { kind: &'static str, id: i32 },

    #[error("You do not have permission to perform this action")]
    Forbidden,

    #[error("Authentication credentials were not provided or are invalid")]
    Unauthorized,

    #[error("Unable to log in with provided credentials")]
    InvalidCredentials,

    #[error("{0} already exists")]
    AlreadyExists(&'static str),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0} is empty")]
    EmptyCollection(&'static str),

    #[error("You cannot subscribe to yourself")]
    SelfReferenceNotAllowed,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl AppError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::ValidationFailed {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Maps a failed membership insert to `AlreadyExists` when the store
    /// rejected it on the uniqueness constraint
    pub fn from_insert(err: DbErr, what: &'static str) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => AppError::AlreadyExists(what),
            _ => AppError::Database(err),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationFailed { .. }
            | AppError::ReferenceNotFound { .. }
            | AppError::InvalidCredentials
            | AppError::AlreadyExists(_)
            | AppError::NotFound(_)
            | AppError::EmptyCollection(_)
            | AppError::SelfReferenceNotAllowed => StatusCode::BAD_REQUEST,
            AppError::ObjectNotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Storage(_) | AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

const NON_FIELD_ERRORS: &str = "non_field_errors";

/// Splits a body deserialization message into the offending top-level
/// field and the reason, e.g. `ingredients[0].amount: invalid type: ...`
fn field_error(detail: &str) -> (String, String) {
    let detail = detail
        .split_once("target type: ")
        .map_or(detail, |(_, rest)| rest);

    if let Some((path, reason)) = detail.split_once(": ") {
        if !path.is_empty() && !path.contains(char::is_whitespace) {
            let field = path
                .split(['.', '['])
                .next()
                .filter(|f| !f.is_empty())
                .unwrap_or(NON_FIELD_ERRORS);
            return (field.to_string(), reason.to_string());
        }
    }

    if let Some(rest) = detail.strip_prefix("missing field `") {
        if let Some((field, _)) = rest.split_once('`') {
            return (field.to_string(), "This field is required.".to_string());
        }
    }

    (NON_FIELD_ERRORS.to_string(), detail.to_string())
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        let (field, reason) = match &rejection {
            JsonRejection::JsonDataError(_) => field_error(&rejection.body_text()),
            _ => (NON_FIELD_ERRORS.to_string(), rejection.body_text()),
        };
        AppError::ValidationFailed { field, reason }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self {
            AppError::ValidationFailed { field, reason } => json!({ field.as_str(): [reason] }),
            AppError::Database(err) => {
                log::error!("Database failure: {err}");
                json!({ "errors": "Internal server error" })
            }
            other => json!({ "errors": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
