//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<pillbox_core::Error> for ApiError {
  fn from(e: pillbox_core::Error) -> Self {
    match e {
      pillbox_core::Error::InvalidDate(_) => ApiError::BadRequest(e.to_string()),
      pillbox_core::Error::EntryNotFound(_) => ApiError::NotFound(e.to_string()),
      pillbox_core::Error::UnresolvedSupplement { .. } => ApiError::Store(Box::new(e)),
      pillbox_core::Error::Store(inner) => ApiError::Store(inner),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}

#[cfg(test)]
mod tests {
  use uuid::Uuid;

  use super::*;

  #[test]
  fn core_errors_map_to_status_codes() {
    let cases = [
      (pillbox_core::Error::InvalidDate("x".into()), StatusCode::BAD_REQUEST),
      (pillbox_core::Error::EntryNotFound(Uuid::nil()), StatusCode::NOT_FOUND),
      (
        pillbox_core::Error::UnresolvedSupplement {
          entry_id:      Uuid::nil(),
          supplement_id: Uuid::nil(),
        },
        StatusCode::INTERNAL_SERVER_ERROR,
      ),
      (
        pillbox_core::Error::Store("disk full".into()),
        StatusCode::INTERNAL_SERVER_ERROR,
      ),
    ];
    for (err, status) in cases {
      assert_eq!(ApiError::from(err).into_response().status(), status);
    }
  }
}
