//! HTTP-facing error type and its [`IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use showwatch_core::{Error as CoreError, store::StoreError};
use thiserror::Error;

use crate::acquisition::AcquisitionError;

#[derive(Debug, Error)]
pub enum Error {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error(transparent)]
  Acquisition(#[from] AcquisitionError),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Map a store error, surfacing rejected operations as client errors.
  pub fn from_store<E: StoreError>(e: E) -> Self {
    match e.domain() {
      Some(CoreError::SubscriptionNotFound(_)) => Error::NotFound(e.to_string()),
      Some(CoreError::AlreadyActive(_) | CoreError::AlreadyInactive(_)) => {
        Error::Conflict(e.to_string())
      }
      Some(CoreError::InvalidListingUrl { .. }) => Error::BadRequest(e.to_string()),
      _ => Error::Store(Box::new(e)),
    }
  }
}

impl From<CoreError> for Error {
  fn from(e: CoreError) -> Self {
    match e {
      CoreError::SubscriptionNotFound(_) => Error::NotFound(e.to_string()),
      CoreError::AlreadyActive(_) | CoreError::AlreadyInactive(_) => Error::Conflict(e.to_string()),
      other => Error::BadRequest(other.to_string()),
    }
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let status = match &self {
      Error::NotFound(_) => StatusCode::NOT_FOUND,
      Error::BadRequest(_) => StatusCode::BAD_REQUEST,
      Error::Conflict(_) => StatusCode::CONFLICT,
      Error::Acquisition(_) => StatusCode::BAD_GATEWAY,
      Error::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let message = match &self {
      Error::NotFound(m) | Error::BadRequest(m) | Error::Conflict(m) => m.clone(),
      other => other.to_string(),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
