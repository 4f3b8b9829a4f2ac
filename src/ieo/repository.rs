use futures::TryStreamExt;
use mongodb::{
  bson::{doc, oid::ObjectId},
  options::FindOptions,
  Collection,
};

use crate::{db::MongoDb, error::AppError};

use super::model::IeoOffering;

const COLLECTION: &str = "ieo_offerings";

#[derive(Clone)]
pub struct IeoRepository {
  db: MongoDb,
}

impl IeoRepository {
  pub fn new(db: MongoDb) -> Self {
      Self { db }
  }

  fn collection(&self) -> Collection<IeoOffering> {
      self.db.typed_collection(COLLECTION)
  }

  pub async fn list(&self) -> Result<Vec<IeoOffering>, AppError> {
      let options = FindOptions::builder().sort(doc! { "starts_at": 1 }).build();

      let offerings = self
          .collection()
          .find(doc! {}, options)
          .await?
          .try_collect()
          .await?;

      Ok(offerings)
  }

  pub async fn find_by_id(&self, id: &ObjectId) -> Result<IeoOffering, AppError> {
      self.collection()
          .find_one(doc! { "_id": id }, None)
          .await?
          .ok_or_else(|| AppError::NotFoundError(format!("IEO offering with ID {} not found", id)))
  }
}
