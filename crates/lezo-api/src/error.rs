//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use lezo_core::store::StoreError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("precondition failed: the record has changed")]
  PreconditionFailed,

  #[error("unprocessable batch: {0}")]
  Unprocessable(String),

  #[error("encoding error: {0}")]
  Encode(#[from] serde_json::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Map a backend error to a response class using the domain error it
  /// wraps. Anything without a domain meaning is a 500.
  pub fn from_store<E: StoreError>(e: E) -> Self {
    use lezo_core::Error as Core;

    let mapped = match e.as_core() {
      Some(core @ Core::CitizenNotFound(_)) => Some(Self::NotFound(core.to_string())),
      Some(core @ (Core::DuplicateCitizen(_) | Core::DuplicateRelationship { .. })) => {
        Some(Self::Conflict(core.to_string()))
      }
      Some(
        core @ (Core::SelfRelationship(_) | Core::UnknownRegion(_) | Core::UnknownValue { .. }),
      ) => Some(Self::BadRequest(core.to_string())),
      Some(Core::Unavailable(_)) | None => None,
    };
    mapped.unwrap_or_else(|| Self::Store(Box::new(e)))
  }
}

impl From<lezo_import::Error> for ApiError {
  fn from(e: lezo_import::Error) -> Self {
    match e {
      lezo_import::Error::Unreadable(_) => Self::BadRequest(e.to_string()),
      _ => Self::Unprocessable(e.to_string()),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Forbidden(m) => (StatusCode::FORBIDDEN, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::PreconditionFailed => (StatusCode::PRECONDITION_FAILED, self.to_string()),
      ApiError::Unprocessable(m) => (StatusCode::UNPROCESSABLE_ENTITY, m.clone()),
      ApiError::Encode(_) | ApiError::Store(_) => {
        tracing::error!(error = %self, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
