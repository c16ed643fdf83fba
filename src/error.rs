//! Typed errors and HTTP mapping.

use crate::render;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing setting: {0}")]
    MissingSetting(String),
    #[error("cannot resolve dotted path '{0}'")]
    Unresolvable(String),
    #[error("setting '{key}' is not a {expected}")]
    WrongType { key: String, expected: &'static str },
    #[error("missing reference: {kind} '{id}'")]
    MissingReference { kind: &'static str, id: String },
    #[error("invalid primary key: table {table} column {column}")]
    InvalidPrimaryKey { table: String, column: String },
    #[error("duplicate table: {0}")]
    DuplicateTable(String),
    #[error("config load: {0}")]
    Load(String),
    #[error("validation: {0}")]
    Validation(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The payload is only logged; the message shown to clients is fixed.
    #[error("The resource could not be found.")]
    NotFound(String),
    #[error("validation: {0}")]
    Validation(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
}

impl AppError {
    pub fn not_found(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        tracing::warn!(detail = %detail, "not found");
        AppError::NotFound(detail)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Db(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
            AppError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let message = match &self {
            AppError::Db(sqlx::Error::RowNotFound) => "The resource could not be found.".to_string(),
            other => other.to_string(),
        };
        (status, Html(render::error_page(status, &message))).into_response()
    }
}
