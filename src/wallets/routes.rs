use axum::{routing::get, Router};

use crate::wallets::{handler, service::WalletService};

pub fn wallet_routes(service: WalletService) -> Router {
    Router::new()
        .route("/top-tokens", get(handler::get_top_tokens))
        .with_state(service)
}
