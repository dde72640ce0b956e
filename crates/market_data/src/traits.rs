use async_trait::async_trait;

use common::models::{Candle, FeedItem};

use crate::error::MarketDataError;

/// Converts a wire payload into a domain model.
pub trait RemoteResponse<T> {
    fn to_model(&self) -> Result<T, MarketDataError>;
}

/// Ordered (open-time, close) samples for a trading pair, oldest first.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CandleSource: Send + Sync {
    async fn candles(
        &self,
        symbol: &str,
        interval: &str,
        limit: u32,
    ) -> Result<Vec<Candle>, MarketDataError>;
}

/// A single USD quote for a ticker such as `BTC`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpotPriceSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn usd_price(&self, symbol: &str) -> Result<f64, MarketDataError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NewsFeedSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<FeedItem>, MarketDataError>;
}
