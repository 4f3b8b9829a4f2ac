use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::error::AppError;
use crate::market::service::PriceSource;
use crate::wallets::model::{TopToken, TopTokenSnapshot};

#[derive(Clone)]
pub struct WalletService {
    source: Arc<dyn PriceSource>,
    symbols: Arc<Vec<String>>,
    top_tokens: Arc<RwLock<Option<TopTokenSnapshot>>>,
}

impl WalletService {
    pub fn new(source: Arc<dyn PriceSource>, symbols: Vec<String>) -> Self {
        Self {
            source,
            symbols: Arc::new(symbols),
            top_tokens: Arc::new(RwLock::new(None)),
        }
    }

    /// Latest cached snapshot, `None` until the first successful refresh.
    pub fn top_tokens(&self) -> Option<TopTokenSnapshot> {
        self.top_tokens.read().clone()
    }

    /// Fetches every configured symbol and replaces the cached snapshot.
    ///
    /// Symbols that fail are logged and left out. The refresh only fails when
    /// no symbol could be fetched, in which case the previous snapshot is kept.
    pub async fn refresh_top_tokens(&self) -> Result<TopTokenSnapshot, AppError> {
        if self.symbols.is_empty() {
            return Err(AppError::ConfigError("No top token symbols configured".into()));
        }

        let fetches = self
            .symbols
            .iter()
            .map(|symbol| self.source.ticker_price(symbol));
        let results = join_all(fetches).await;

        let mut tokens = Vec::with_capacity(results.len());
        for (index, (symbol, result)) in self.symbols.iter().zip(results).enumerate() {
            match result {
                Ok(ticker) => tokens.push(TopToken {
                    rank: index + 1,
                    symbol: ticker.symbol,
                    price: ticker.price,
                    timestamp: ticker.timestamp,
                }),
                Err(e) => warn!(symbol = %symbol, error = %e, "Failed to fetch top token price"),
            }
        }

        if tokens.is_empty() {
            return Err(AppError::MarketDataError(format!(
                "All {} top token fetches failed",
                self.symbols.len()
            )));
        }

        let snapshot = TopTokenSnapshot {
            tokens,
            refreshed_at: Utc::now(),
        };
        debug!(count = snapshot.tokens.len(), "Top token snapshot replaced");
        *self.top_tokens.write() = Some(snapshot.clone());

        Ok(snapshot)
    }
}
