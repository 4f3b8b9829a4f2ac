use axum::{extract::State, Json};

use crate::wallets::{model::TopTokensResponse, service::WalletService};

pub async fn get_top_tokens(State(service): State<WalletService>) -> Json<TopTokensResponse> {
    Json(service.top_tokens().into())
}
