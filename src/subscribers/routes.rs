use axum::{
  routing::{delete, post},
  Router,
};

use crate::{
  db::MongoDb,
  subscribers::{handler, repository::SubscriberRepository, service::SubscriberService},
};

pub fn subscriber_routes(db: MongoDb) -> Router {
  let service = SubscriberService::new(SubscriberRepository::new(db));

  Router::new()
      .route("/", post(handler::subscribe))
      .route("/:email", delete(handler::unsubscribe))
      .with_state(service)
}
