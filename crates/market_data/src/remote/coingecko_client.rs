use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::MarketDataError;
use crate::remote::ensure_success;
use crate::traits::SpotPriceSource;

pub const COINGECKO_BASE_URL: &str = "https://api.coingecko.com";

const COIN_IDS: &[(&str, &str)] = &[
    ("BTC", "bitcoin"),
    ("ETH", "ethereum"),
    ("XRP", "ripple"),
    ("BNB", "binancecoin"),
    ("SOL", "solana"),
    ("DOGE", "dogecoin"),
    ("ADA", "cardano"),
    ("TRX", "tron"),
    ("TON", "the-open-network"),
    ("AVAX", "avalanche-2"),
    ("DOT", "polkadot"),
    ("LINK", "chainlink"),
    ("LTC", "litecoin"),
    ("UNI", "uniswap"),
    ("XLM", "stellar"),
    ("ICP", "internet-computer"),
    ("APT", "aptos"),
    ("NEAR", "near"),
    ("ETC", "ethereum-classic"),
    ("ATOM", "cosmos"),
];

#[derive(Clone)]
pub struct CoinGeckoClient {
    client: Client,
    base_url: String,
}

impl CoinGeckoClient {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, COINGECKO_BASE_URL)
    }

    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Ticker to CoinGecko id. Unknown tickers are tried as their lowercase form,
    /// which also lets callers pass an id such as `bitcoin` directly.
    pub fn coin_id(symbol: &str) -> String {
        let upper = symbol.trim().to_uppercase();
        COIN_IDS
            .iter()
            .find(|(ticker, _)| *ticker == upper)
            .map(|(_, id)| id.to_string())
            .unwrap_or_else(|| symbol.trim().to_lowercase())
    }
}

#[async_trait]
impl SpotPriceSource for CoinGeckoClient {
    fn name(&self) -> &'static str {
        "coingecko"
    }

    async fn usd_price(&self, symbol: &str) -> Result<f64, MarketDataError> {
        let url = format!("{}/api/v3/simple/price", self.base_url);
        let id = Self::coin_id(symbol);

        let response = self
            .client
            .get(&url)
            .query(&[("ids", id.as_str()), ("vs_currencies", "usd")])
            .send()
            .await?;

        let quotes = ensure_success(response)
            .await?
            .json::<HashMap<String, HashMap<String, f64>>>()
            .await?;

        quotes
            .get(&id)
            .and_then(|q| q.get("usd"))
            .copied()
            .ok_or(MarketDataError::NotFound(id))
    }
}
