use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use common::models::Candle;

use crate::error::MarketDataError;
use crate::remote::{KlineRow, TickerPriceResponse, ensure_success};
use crate::traits::{CandleSource, RemoteResponse, SpotPriceSource};

pub const BINANCE_BASE_URL: &str = "https://api.binance.com";

/// Public (unsigned) Binance spot endpoints: klines and ticker price.
#[derive(Clone)]
pub struct BinanceClient {
    client: Client,
    base_url: String,
}

impl BinanceClient {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, BINANCE_BASE_URL)
    }

    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// `BTC` -> `BTCUSDT`; full pairs pass through.
    pub fn usdt_pair(symbol: &str) -> String {
        let upper = symbol.trim().to_uppercase();
        if upper.ends_with("USDT") {
            upper
        } else {
            format!("{}USDT", upper)
        }
    }
}

#[async_trait]
impl CandleSource for BinanceClient {
    async fn candles(
        &self,
        symbol: &str,
        interval: &str,
        limit: u32,
    ) -> Result<Vec<Candle>, MarketDataError> {
        let url = format!("{}/api/v3/klines", self.base_url);
        let limit = limit.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[("symbol", symbol), ("interval", interval), ("limit", limit.as_str())])
            .send()
            .await?;

        let rows = ensure_success(response)
            .await?
            .json::<Vec<KlineRow>>()
            .await?;

        let mut candles: Vec<Candle> = rows
            .iter()
            .map(|row| row.to_model())
            .collect::<Result<_, _>>()?;
        candles.sort_by_key(|c| c.open_time);
        candles.dedup_by_key(|c| c.open_time);

        debug!("Fetched {} {} candles for {}", candles.len(), interval, symbol);
        Ok(candles)
    }
}

#[async_trait]
impl SpotPriceSource for BinanceClient {
    fn name(&self) -> &'static str {
        "binance"
    }

    async fn usd_price(&self, symbol: &str) -> Result<f64, MarketDataError> {
        let url = format!("{}/api/v3/ticker/price", self.base_url);
        let pair = Self::usdt_pair(symbol);

        let response = self
            .client
            .get(&url)
            .query(&[("symbol", pair.as_str())])
            .send()
            .await?;

        let ticker = ensure_success(response)
            .await?
            .json::<TickerPriceResponse>()
            .await?;

        ticker.to_model()
    }
}
