use mongodb::{bson::doc, Collection};

use crate::{db::MongoDb, error::AppError};

use super::model::Subscriber;

const COLLECTION: &str = "subscribers";

#[derive(Clone)]
pub struct SubscriberRepository {
  db: MongoDb,
}

impl SubscriberRepository {
  pub fn new(db: MongoDb) -> Self {
      Self { db }
  }

  fn collection(&self) -> Collection<Subscriber> {
      self.db.typed_collection(COLLECTION)
  }

  pub async fn create(&self, subscriber: Subscriber) -> Result<Subscriber, AppError> {
      let collection = self.collection();

      let existing = collection
          .find_one(doc! { "email": &subscriber.email }, None)
          .await?;

      if existing.is_some() {
          return Err(AppError::ValidationError("Email already subscribed".into()));
      }

      let result = collection.insert_one(&subscriber, None).await?;

      let id = result
          .inserted_id
          .as_object_id()
          .ok_or_else(|| AppError::DatabaseError("Failed to get inserted ID".into()))?;

      Ok(Subscriber {
          id: Some(id),
          ..subscriber
      })
  }

  pub async fn delete_by_email(&self, email: &str) -> Result<bool, AppError> {
      let result = self
          .collection()
          .delete_one(doc! { "email": email }, None)
          .await?;

      Ok(result.deleted_count > 0)
  }
}
