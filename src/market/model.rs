use serde::{Deserialize, Serialize};

/// Last traded price for a single market, as reported by the exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerPrice {
    pub symbol: String,
    pub price: String,
    /// Exchange timestamp in milliseconds.
    pub timestamp: u64,
}
