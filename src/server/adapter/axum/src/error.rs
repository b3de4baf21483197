/* src/server/adapter/axum/src/error.rs */

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use inertia_server::InertiaError;

/// Newtype so the core error can answer as an axum response.
#[derive(Debug)]
pub struct AxumError(pub InertiaError);

impl From<InertiaError> for AxumError {
  fn from(err: InertiaError) -> Self {
    Self(err)
  }
}

impl IntoResponse for AxumError {
  fn into_response(self) -> Response {
    let status =
      StatusCode::from_u16(self.0.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if self.0.is_configuration() {
      tracing::error!(code = self.0.code(), "{}", self.0);
    } else {
      tracing::warn!(code = self.0.code(), "{}", self.0);
    }
    let body = serde_json::json!({
      "ok": false,
      "error": {
        "code": self.0.code(),
        "message": self.0.to_string(),
      }
    });
    (status, axum::Json(body)).into_response()
  }
}
