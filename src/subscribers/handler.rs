use axum::{extract::State, http::StatusCode, Json};

use crate::{
  api::extract::{AppJson, AppPath},
  error::AppError,
  subscribers::{
      model::{SubscribeRequest, SubscriberResponse},
      service::SubscriberService,
  },
};

pub async fn subscribe(
  State(service): State<SubscriberService>,
  AppJson(req): AppJson<SubscribeRequest>,
) -> Result<(StatusCode, Json<SubscriberResponse>), AppError> {
  let subscriber = service.subscribe(req).await?;
  Ok((StatusCode::CREATED, Json(subscriber)))
}

pub async fn unsubscribe(
  State(service): State<SubscriberService>,
  AppPath(email): AppPath<String>,
) -> Result<StatusCode, AppError> {
  service.unsubscribe(&email).await?;
  Ok(StatusCode::NO_CONTENT)
}
