use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use kucoin_rs::{kucoin::client::Kucoin, kucoin::client::KucoinEnv};

use crate::error::AppError;
use crate::market::model::TickerPrice;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Source of spot prices used by the top token refresh.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn ticker_price(&self, symbol: &str) -> Result<TickerPrice, AppError>;
}

#[derive(Clone)]
pub struct KucoinPriceSource {
    client: Arc<Kucoin>,
}

impl KucoinPriceSource {
    pub fn new() -> Result<Self, AppError> {
        // Public market endpoints only, no API credentials
        let client = Kucoin::new(KucoinEnv::Live, None)
            .map_err(|e| AppError::MarketDataError(format!("Failed to initialize KuCoin client: {}", e)))?;

        Ok(Self {
            client: Arc::new(client),
        })
    }
}

#[async_trait]
impl PriceSource for KucoinPriceSource {
    async fn ticker_price(&self, symbol: &str) -> Result<TickerPrice, AppError> {
        let ticker_response = tokio::time::timeout(FETCH_TIMEOUT, self.client.get_ticker(symbol))
            .await
            .map_err(|_| AppError::MarketDataError(format!("KuCoin request for {} timed out", symbol)))?
            .map_err(|e| AppError::MarketDataError(format!("KuCoin API error: {}", e)))?;

        let ticker_data = ticker_response
            .data
            .ok_or_else(|| AppError::MarketDataError(format!("No ticker data returned for {}", symbol)))?;

        Ok(TickerPrice {
            symbol: symbol.to_string(),
            price: ticker_data.price,
            timestamp: ticker_data.time.max(0) as u64,
        })
    }
}
