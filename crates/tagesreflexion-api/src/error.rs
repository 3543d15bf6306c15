//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use tagesreflexion_core::{Classify, Fault};
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("{source}")]
  Store {
    fault:  Fault,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },
}

impl ApiError {
  /// Wrap a store error, remembering its fault for the response status.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Classify + Send + Sync + 'static,
  {
    Self::Store { fault: e.fault(), source: Box::new(e) }
  }
}

/// Path and body values that fail core parsing (roles, dates).
impl From<tagesreflexion_core::Error> for ApiError {
  fn from(e: tagesreflexion_core::Error) -> Self {
    Self::BadRequest(e.to_string())
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    Self::BadRequest(rejection.body_text())
  }
}

impl From<PathRejection> for ApiError {
  fn from(rejection: PathRejection) -> Self {
    Self::BadRequest(rejection.body_text())
  }
}

fn status_for(fault: Fault) -> StatusCode {
  match fault {
    Fault::Validation => StatusCode::BAD_REQUEST,
    Fault::Precondition => StatusCode::CONFLICT,
    Fault::NotFound => StatusCode::NOT_FOUND,
    Fault::Storage => StatusCode::INTERNAL_SERVER_ERROR,
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Store { fault, source } => (status_for(*fault), source.to_string()),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
