use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopToken {
    /// 1-based position in the configured symbol list.
    pub rank: usize,
    pub symbol: String,
    pub price: String,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopTokenSnapshot {
    pub tokens: Vec<TopToken>,
    pub refreshed_at: DateTime<Utc>,
}

// Top tokens sent to client
#[derive(Debug, Serialize)]
pub struct TopTokensResponse {
    pub tokens: Vec<TopToken>,
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl From<Option<TopTokenSnapshot>> for TopTokensResponse {
    fn from(snapshot: Option<TopTokenSnapshot>) -> Self {
        match snapshot {
            Some(snapshot) => Self {
                tokens: snapshot.tokens,
                refreshed_at: Some(snapshot.refreshed_at),
            },
            None => Self {
                tokens: Vec::new(),
                refreshed_at: None,
            },
        }
    }
}
