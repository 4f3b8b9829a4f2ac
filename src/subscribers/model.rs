use chrono::{DateTime, Utc};
use mongodb::bson::{self, oid::ObjectId};
use serde::{Deserialize, Serialize};
use validator::Validate;

// Subscriber document stored in MongoDB
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Subscriber {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub email: String,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Subscriber {
    pub fn new(email: String) -> Self {
        Self {
            id: None,
            email,
            created_at: Utc::now(),
        }
    }
}

// Newsletter subscription request
#[derive(Debug, Deserialize, Validate)]
pub struct SubscribeRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct SubscriberResponse {
    pub id: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<Subscriber> for SubscriberResponse {
    fn from(subscriber: Subscriber) -> Self {
        Self {
            id: subscriber.id.unwrap_or_default().to_hex(),
            email: subscriber.email,
            created_at: subscriber.created_at,
        }
    }
}
