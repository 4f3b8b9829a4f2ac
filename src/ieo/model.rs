use chrono::{DateTime, Utc};
use mongodb::bson::{self, oid::ObjectId};
use serde::{Deserialize, Serialize};

// IEO offering document stored in MongoDB
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct IeoOffering {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub symbol: String,
    pub price_usd: f64,
    pub total_supply: f64,
    #[serde(default)]
    pub sold: f64,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub starts_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub ends_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IeoStatus {
    Upcoming,
    Active,
    Ended,
}

impl IeoOffering {
    /// Sold-out offerings end early.
    pub fn status_at(&self, now: DateTime<Utc>) -> IeoStatus {
        if now < self.starts_at {
            IeoStatus::Upcoming
        } else if now >= self.ends_at || self.sold >= self.total_supply {
            IeoStatus::Ended
        } else {
            IeoStatus::Active
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IeoOfferingResponse {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub price_usd: f64,
    pub total_supply: f64,
    pub sold: f64,
    pub remaining: f64,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub status: IeoStatus,
}

impl IeoOfferingResponse {
    pub fn from_offering(offering: IeoOffering, now: DateTime<Utc>) -> Self {
        let status = offering.status_at(now);
        Self {
            id: offering.id.unwrap_or_default().to_hex(),
            remaining: (offering.total_supply - offering.sold).max(0.0),
            name: offering.name,
            symbol: offering.symbol,
            price_usd: offering.price_usd,
            total_supply: offering.total_supply,
            sold: offering.sold,
            starts_at: offering.starts_at,
            ends_at: offering.ends_at,
            status,
        }
    }
}
