//! Request-boundary error type. Every handler returns `Result<_, AppError>`;
//! the `IntoResponse` impl turns it into `{ "error": "..." }` with a status code.

use axum::{
  extract::rejection::{JsonRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::generator::GeneratorError;
use crate::store::StorageError;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppError {
  #[error("Unauthorized")]
  Unauthorized,
  #[error("{0}")]
  Validation(String),
  #[error("{0}")]
  NotFound(String),
  #[error("Forbidden")]
  Forbidden,
  #[error("{0}")]
  Conflict(String),
  #[error("{0}")]
  Upstream(String),
  #[error("{0}")]
  Internal(String),
}

/// Failures while building `AppState`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StartupError {
  #[error(transparent)]
  Storage(#[from] StorageError),
  #[error(transparent)]
  Generator(#[from] GeneratorError),
}

impl AppError {
  pub fn status(&self) -> StatusCode {
    match self {
      AppError::Unauthorized => StatusCode::UNAUTHORIZED,
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Forbidden => StatusCode::FORBIDDEN,
      AppError::Conflict(_) => StatusCode::CONFLICT,
      AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
      AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      error!(target: "practice_backend", %status, error = %self, "request failed");
    } else {
      warn!(target: "practice_backend", %status, error = %self, "request rejected");
    }
    // Internal details stay in the logs.
    let message = match &self {
      AppError::Internal(_) => "Internal server error".to_string(),
      other => other.to_string(),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}

impl From<StorageError> for AppError {
  fn from(e: StorageError) -> Self {
    match e {
      StorageError::NotFound => AppError::NotFound("Not found".into()),
      StorageError::Conflict(msg) => AppError::Conflict(msg),
      other => AppError::Internal(other.to_string()),
    }
  }
}

impl From<GeneratorError> for AppError {
  fn from(e: GeneratorError) -> Self {
    AppError::Upstream(e.to_string())
  }
}

impl From<JsonRejection> for AppError {
  fn from(e: JsonRejection) -> Self {
    AppError::Validation(format!("Invalid JSON body: {}", e.body_text()))
  }
}

impl From<QueryRejection> for AppError {
  fn from(e: QueryRejection) -> Self {
    AppError::Validation(format!("Invalid query: {}", e.body_text()))
  }
}
