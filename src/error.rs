use axum::{
  extract::rejection::{JsonRejection, PathRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
  #[error("Authentication error: {0}")]
  AuthError(String),

  #[error("Validation error: {0}")]
  ValidationError(String),

  #[error("Database error: {0}")]
  DatabaseError(String),

  #[error("Config error: {0}")]
  ConfigError(String),

  #[error("Not found: {0}")]
  NotFoundError(String),

  #[error("Endpoint Not Found")]
  RouteNotFound,

  #[error("Payload too large: {0}")]
  PayloadTooLarge(String),

  #[error("Market data error: {0}")]
  MarketDataError(String),

  #[error("Internal server error: {0}")]
  InternalError(String),
}

impl AppError {
  pub fn status_code(&self) -> StatusCode {
      match self {
          AppError::AuthError(_) => StatusCode::UNAUTHORIZED,
          AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
          AppError::NotFoundError(_) | AppError::RouteNotFound => StatusCode::NOT_FOUND,
          AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
          AppError::MarketDataError(_) => StatusCode::BAD_GATEWAY,
          AppError::DatabaseError(_)
          | AppError::ConfigError(_)
          | AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
      }
  }
}

impl From<mongodb::error::Error> for AppError {
  fn from(err: mongodb::error::Error) -> Self {
      Self::DatabaseError(err.to_string())
  }
}

impl From<std::io::Error> for AppError {
  fn from(err: std::io::Error) -> Self {
      Self::InternalError(err.to_string())
  }
}

impl From<validator::ValidationErrors> for AppError {
  fn from(err: validator::ValidationErrors) -> Self {
      Self::ValidationError(err.to_string())
  }
}

impl From<JsonRejection> for AppError {
  fn from(rejection: JsonRejection) -> Self {
      if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
          Self::PayloadTooLarge(rejection.body_text())
      } else {
          Self::ValidationError(rejection.body_text())
      }
  }
}

impl From<PathRejection> for AppError {
  fn from(rejection: PathRejection) -> Self {
      Self::ValidationError(rejection.body_text())
  }
}

impl From<QueryRejection> for AppError {
  fn from(rejection: QueryRejection) -> Self {
      Self::ValidationError(rejection.body_text())
  }
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
      let status = self.status_code();
      let error_message = match &self {
          AppError::ConfigError(_) => "A configuration error occurred".to_string(),
          AppError::DatabaseError(err) => format!("Database error: {}", err),
          AppError::InternalError(err) => format!("An internal server error occurred: {}", err),
          _ => self.to_string(),
      };

      if status.is_server_error() {
          tracing::error!(status = %status, "{}", self);
      }

      let body = Json(json!({
          "status": "error",
          "message": error_message,
      }));

      (status, body).into_response()
  }
}
