use futures::TryStreamExt;
use mongodb::{bson::doc, options::FindOptions, Collection};

use crate::{db::MongoDb, error::AppError};

use super::model::{OffersQuery, P2pOffer};

const COLLECTION: &str = "p2p_offers";

#[derive(Clone)]
pub struct P2pRepository {
  db: MongoDb,
}

impl P2pRepository {
  pub fn new(db: MongoDb) -> Self {
      Self { db }
  }

  fn collection(&self) -> Collection<P2pOffer> {
      self.db.typed_collection(COLLECTION)
  }

  pub async fn list_open_offers(&self, query: &OffersQuery) -> Result<Vec<P2pOffer>, AppError> {
      // Newest first
      let options = FindOptions::builder().sort(doc! { "created_at": -1 }).build();

      let offers = self
          .collection()
          .find(query.to_filter(), options)
          .await?
          .try_collect()
          .await?;

      Ok(offers)
  }
}
