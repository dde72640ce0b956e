use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use mockall::mock;
use tempfile::TempDir;

use common::models::{Candle, ChartSpec, FeedItem};
use common::traits::{ChartRenderer, DeliveryError, MessageSink};
use market_data::{CandleSource, MarketDataError, NewsFeedSource, SpotPriceSource};
use storage::{HistoryLimits, JsonStateStore};

mock! {
    pub Sink {}
    #[async_trait]
    impl MessageSink for Sink {
        async fn send_text(&self, destination: i64, text: &str) -> Result<(), DeliveryError>;
        async fn send_photo(
            &self,
            destination: i64,
            image: Vec<u8>,
            caption: &str,
        ) -> Result<(), DeliveryError>;
    }
}

mock! {
    pub Feeds {}
    #[async_trait]
    impl NewsFeedSource for Feeds {
        async fn fetch(&self, url: &str) -> Result<Vec<FeedItem>, MarketDataError>;
    }
}

mock! {
    pub Candles {}
    #[async_trait]
    impl CandleSource for Candles {
        async fn candles(
            &self,
            symbol: &str,
            interval: &str,
            limit: u32,
        ) -> Result<Vec<Candle>, MarketDataError>;
    }
}

mock! {
    pub Prices {}
    #[async_trait]
    impl SpotPriceSource for Prices {
        fn name(&self) -> &'static str;
        async fn usd_price(&self, symbol: &str) -> Result<f64, MarketDataError>;
    }
}

mock! {
    pub Renderer {}
    impl ChartRenderer for Renderer {
        fn render(&self, chart: &ChartSpec) -> Option<Vec<u8>>;
    }
}

pub type Outbox = Arc<Mutex<Vec<(i64, String)>>>;

/// A sink that accepts every text message and keeps a copy.
pub fn recording_sink() -> (MockSink, Outbox) {
    let outbox: Outbox = Arc::default();
    let mut sink = MockSink::new();
    let captured = outbox.clone();
    sink.expect_send_text().returning(move |chat, text| {
        captured.lock().unwrap().push((chat, text.to_string()));
        Ok(())
    });
    (sink, outbox)
}

pub fn temp_store(dir: &TempDir) -> Arc<JsonStateStore> {
    Arc::new(JsonStateStore::new(dir.path(), HistoryLimits::default()))
}

pub fn fresh_item(title: &str, minutes_old: i64) -> FeedItem {
    FeedItem {
        title: title.to_string(),
        link: format!("https://wire.example/{}", minutes_old),
        published_at: Utc::now() - Duration::minutes(minutes_old),
    }
}

pub fn uptrend_candles(n: usize) -> Vec<Candle> {
    (0..n)
        .map(|i| Candle::new(i as i64 * 900_000, 100.0 + i as f64 * 0.8 + (i % 4) as f64 * 0.3))
        .collect()
}

/// Accepts every message after a pause, so overlapping batches get a chance to interleave.
pub struct SlowSink {
    pub delay: std::time::Duration,
    pub outbox: Outbox,
}

impl SlowSink {
    pub fn new(delay: std::time::Duration) -> (Self, Outbox) {
        let outbox: Outbox = Arc::default();
        (
            Self {
                delay,
                outbox: outbox.clone(),
            },
            outbox,
        )
    }
}

#[async_trait]
impl MessageSink for SlowSink {
    async fn send_text(&self, destination: i64, text: &str) -> Result<(), DeliveryError> {
        tokio::time::sleep(self.delay).await;
        self.outbox.lock().unwrap().push((destination, text.to_string()));
        Ok(())
    }

    async fn send_photo(
        &self,
        destination: i64,
        _image: Vec<u8>,
        caption: &str,
    ) -> Result<(), DeliveryError> {
        self.send_text(destination, caption).await
    }
}
