use axum::{routing::get, Router};

use crate::{
  db::MongoDb,
  p2p::{handler, repository::P2pRepository},
};

pub fn p2p_routes(db: MongoDb) -> Router {
  Router::new()
      .route("/offers", get(handler::list_offers))
      .with_state(P2pRepository::new(db))
}
