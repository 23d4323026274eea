//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every failure is rendered as `{"success": false, "error": "..."}`.
//! Server-side failures are logged in full and answered with a generic
//! message.

use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection, QueryRejection},
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use cep_core::Error as CoreError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// Credentials were supplied but did not verify.
  #[error("unauthorized")]
  Unauthorized,

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error(transparent)]
  Catalog(#[from] CoreError),
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl From<PathRejection> for ApiError {
  fn from(rejection: PathRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl From<QueryRejection> for ApiError {
  fn from(rejection: QueryRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      Self::Unauthorized => StatusCode::UNAUTHORIZED,
      Self::BadRequest(_) => StatusCode::BAD_REQUEST,
      Self::Catalog(e) => match e {
        CoreError::Forbidden => StatusCode::FORBIDDEN,
        CoreError::Validation(_) | CoreError::InvalidCategory(_) => StatusCode::BAD_REQUEST,
        CoreError::AreaNotFound(_) | CoreError::NotFound(..) => StatusCode::NOT_FOUND,
        CoreError::DuplicateCode(_) | CoreError::Conflict(_) => StatusCode::CONFLICT,
        CoreError::CorruptExistingCode(_)
        | CoreError::SequenceExhausted(_)
        | CoreError::StorageTimeout
        | CoreError::Storage(_)
        | CoreError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
      },
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let message = if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
      "internal server error".to_owned()
    } else {
      self.to_string()
    };

    let mut res = (status, Json(json!({ "success": false, "error": message }))).into_response();
    if status == StatusCode::UNAUTHORIZED {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"cep\""),
      );
    }
    res
  }
}

#[cfg(test)]
mod tests {
  use uuid::Uuid;

  use super::*;

  #[test]
  fn status_mapping() {
    let cases = [
      (CoreError::Forbidden, StatusCode::FORBIDDEN),
      (CoreError::Validation("x".into()), StatusCode::BAD_REQUEST),
      (CoreError::InvalidCategory("gratis".into()), StatusCode::BAD_REQUEST),
      (CoreError::AreaNotFound(Uuid::nil()), StatusCode::NOT_FOUND),
      (CoreError::DuplicateCode("MKT-PRIV-0001".into()), StatusCode::CONFLICT),
      (CoreError::Conflict("email".into()), StatusCode::CONFLICT),
      (CoreError::CorruptExistingCode("MKT-PRIV-00A1".into()), StatusCode::INTERNAL_SERVER_ERROR),
      (CoreError::SequenceExhausted("DEV-TELE-".into()), StatusCode::INTERNAL_SERVER_ERROR),
      (CoreError::StorageTimeout, StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (err, status) in cases {
      assert_eq!(ApiError::from(err).status(), status);
    }
    assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn server_errors_hide_details() {
    let res = ApiError::from(CoreError::CorruptExistingCode("MKT-PRIV-00A1".into())).into_response();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({ "success": false, "error": "internal server error" }));
  }

  #[test]
  fn unauthorized_carries_challenge() {
    let res = ApiError::Unauthorized.into_response();
    assert_eq!(
      res.headers().get(header::WWW_AUTHENTICATE).unwrap(),
      "Basic realm=\"cep\""
    );
  }
}
