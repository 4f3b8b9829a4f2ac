use axum::{routing::get, Router};

use crate::{
  db::MongoDb,
  ieo::{handler, repository::IeoRepository},
};

pub fn ieo_routes(db: MongoDb) -> Router {
  Router::new()
      .route("/", get(handler::list_offerings))
      .route("/:id", get(handler::get_offering))
      .with_state(IeoRepository::new(db))
}
