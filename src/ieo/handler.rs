use axum::{extract::State, Json};
use chrono::Utc;
use mongodb::bson::oid::ObjectId;

use crate::{
  api::extract::AppPath,
  error::AppError,
  ieo::{model::IeoOfferingResponse, repository::IeoRepository},
};

pub async fn list_offerings(
  State(repository): State<IeoRepository>,
) -> Result<Json<Vec<IeoOfferingResponse>>, AppError> {
  let now = Utc::now();
  let offerings = repository
      .list()
      .await?
      .into_iter()
      .map(|offering| IeoOfferingResponse::from_offering(offering, now))
      .collect();

  Ok(Json(offerings))
}

pub async fn get_offering(
  State(repository): State<IeoRepository>,
  AppPath(id): AppPath<String>,
) -> Result<Json<IeoOfferingResponse>, AppError> {
  let object_id = ObjectId::parse_str(&id)
      .map_err(|_| AppError::ValidationError("Invalid offering ID format".into()))?;

  let offering = repository.find_by_id(&object_id).await?;
  Ok(Json(IeoOfferingResponse::from_offering(offering, Utc::now())))
}
