use mongodb::{
  bson,
  options::{ClientOptions, ServerApi, ServerApiVersion},
  Client, Collection, Database,
};
use tracing::debug;

use crate::error::AppError;

#[derive(Clone, Debug)]
pub struct MongoDb {
  pub client: Client,
  pub db: Database,
}

pub async fn connect(uri: &str, db_name: &str) -> Result<MongoDb, AppError> {
  let mut client_options = ClientOptions::parse(uri)
      .await
      .map_err(|e| AppError::DatabaseError(format!("Failed to parse MongoDB connection string: {}", e)))?;

  // Stable API v1 so Atlas clusters behave the same as local ones
  let server_api = ServerApi::builder().version(ServerApiVersion::V1).build();
  client_options.server_api = Some(server_api);
  client_options.app_name = Some("defi-exchange-backend".into());

  let client = Client::with_options(client_options)
      .map_err(|e| AppError::DatabaseError(format!("Failed to create MongoDB client: {}", e)))?;

  client
      .database("admin")
      .run_command(bson::doc! { "ping": 1 }, None)
      .await
      .map_err(|e| AppError::DatabaseError(format!("Failed to connect to MongoDB: {}", e)))?;
  debug!(db = db_name, "MongoDB ping succeeded");

  let db = client.database(db_name);

  Ok(MongoDb { client, db })
}

impl MongoDb {
  pub fn typed_collection<T>(&self, name: &str) -> Collection<T> {
      self.db.collection::<T>(name)
  }
}
