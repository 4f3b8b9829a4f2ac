use axum::{extract::State, Json};

use crate::{
  api::extract::AppQuery,
  error::AppError,
  p2p::{
      model::{OffersQuery, P2pOfferResponse},
      repository::P2pRepository,
  },
};

pub async fn list_offers(
  State(repository): State<P2pRepository>,
  AppQuery(query): AppQuery<OffersQuery>,
) -> Result<Json<Vec<P2pOfferResponse>>, AppError> {
  let offers = repository.list_open_offers(&query).await?;
  Ok(Json(offers.into_iter().map(P2pOfferResponse::from).collect()))
}
