use std::time::Duration;

use reqwest::Client;

use crate::error::MarketDataError;

pub mod binance_client;
pub mod coingecko_client;
pub mod kline_response;
pub mod rss_feed;
pub mod ticker_response;

pub use binance_client::BinanceClient;
pub use coingecko_client::CoinGeckoClient;
pub use kline_response::KlineRow;
pub use rss_feed::RssFeedClient;
pub use ticker_response::TickerPriceResponse;

const USER_AGENT: &str = concat!("crypto_news_bot/", env!("CARGO_PKG_VERSION"));

/// One client for every outbound call, so every request shares the same bounded timeout.
pub fn build_http_client(timeout: Duration) -> Result<Client, MarketDataError> {
    Ok(Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()?)
}

/// Maps non-2xx responses to `MarketDataError::Status`, keeping the body for the log.
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, MarketDataError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(MarketDataError::Status {
        status: status.as_u16(),
        body,
    })
}
