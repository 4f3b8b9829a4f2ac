use chrono::{DateTime, Utc};
use mongodb::bson::{self, doc, oid::ObjectId, Document};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OfferSide {
    Buy,
    Sell,
}

impl OfferSide {
    fn as_str(&self) -> &'static str {
        match self {
            OfferSide::Buy => "buy",
            OfferSide::Sell => "sell",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OfferStatus {
    Open,
    Closed,
}

// P2P offer document stored in MongoDB
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct P2pOffer {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: String,
    pub side: OfferSide,
    pub asset: String,
    pub fiat_currency: String,
    pub price: f64,
    pub min_amount: f64,
    pub max_amount: f64,
    #[serde(default)]
    pub payment_methods: Vec<String>,
    pub status: OfferStatus,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

/// Query string accepted by `GET /offers`.
#[derive(Debug, Default, Deserialize)]
pub struct OffersQuery {
    pub side: Option<OfferSide>,
    pub asset: Option<String>,
}

impl OffersQuery {
    /// Only open offers are listed; assets are stored uppercase.
    pub fn to_filter(&self) -> Document {
        let mut filter = doc! { "status": "open" };
        if let Some(side) = self.side {
            filter.insert("side", side.as_str());
        }
        if let Some(asset) = self.asset.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
            filter.insert("asset", asset.to_uppercase());
        }
        filter
    }
}

#[derive(Debug, Serialize)]
pub struct P2pOfferResponse {
    pub id: String,
    pub user_id: String,
    pub side: OfferSide,
    pub asset: String,
    pub fiat_currency: String,
    pub price: f64,
    pub min_amount: f64,
    pub max_amount: f64,
    pub payment_methods: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<P2pOffer> for P2pOfferResponse {
    fn from(offer: P2pOffer) -> Self {
        Self {
            id: offer.id.unwrap_or_default().to_hex(),
            user_id: offer.user_id,
            side: offer.side,
            asset: offer.asset,
            fiat_currency: offer.fiat_currency,
            price: offer.price,
            min_amount: offer.min_amount,
            max_amount: offer.max_amount,
            payment_methods: offer.payment_methods,
            created_at: offer.created_at,
        }
    }
}
