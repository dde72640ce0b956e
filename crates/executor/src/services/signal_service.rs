use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time;
use tracing::{debug, info, warn};

use common::config::BotConfig;
use common::format::html_escape;
use common::jobs::{Job, JobKind};
use common::models::{QuotaField, SignalPost};
use common::traits::{ChartRenderer, DeliveryError, MessageSink};
use market_data::CandleSource;
use storage::StateStore;
use strategy::compose_signal;

#[derive(Debug, Clone)]
pub struct SignalSettings {
    pub chat_id: i64,
    pub universe: Vec<String>,
    pub interval: String,
    pub candle_limit: u32,
    pub per_run_cap: usize,
    pub max_per_day: u32,
    pub equity: f64,
    pub send_delay: Duration,
}

impl SignalSettings {
    pub fn from_config(config: &BotConfig) -> Self {
        Self {
            chat_id: config.signals.chat_id,
            universe: config.signals.universe.clone(),
            interval: config.signals.interval.clone(),
            candle_limit: config.signals.candle_limit,
            per_run_cap: config.signals.per_run_cap,
            max_per_day: config.limits.max_signals_per_day,
            equity: config.signals.equity,
            send_delay: config.signals.send_delay,
        }
    }
}

/// Builds trade signals for the head of the symbol universe and posts them
/// to the signal channel within the daily quota.
pub struct SignalService {
    store: Arc<dyn StateStore>,
    candles: Arc<dyn CandleSource>,
    renderer: Arc<dyn ChartRenderer>,
    sink: Arc<dyn MessageSink>,
    settings: SignalSettings,
    // Held for a whole batch so a manual run cannot interleave with a scheduled one.
    batch_lock: Mutex<()>,
}

impl SignalService {
    pub fn new(
        store: Arc<dyn StateStore>,
        candles: Arc<dyn CandleSource>,
        renderer: Arc<dyn ChartRenderer>,
        sink: Arc<dyn MessageSink>,
        settings: SignalSettings,
    ) -> Self {
        Self {
            store,
            candles,
            renderer,
            sink,
            settings,
            batch_lock: Mutex::new(()),
        }
    }

    /// Posts one batch and returns how many signals were delivered.
    pub async fn post_batch(&self) -> anyhow::Result<usize> {
        let _batch = self.batch_lock.lock().await;
        let quota = self.store.read().await?;
        let remaining = quota.remaining(QuotaField::Signals, self.settings.max_per_day);
        if remaining == 0 {
            info!(
                "Signal quota reached ({}/{}), skipping batch",
                quota.signals, self.settings.max_per_day
            );
            return Ok(0);
        }

        let take = self.settings.per_run_cap.min(remaining as usize);
        let mut sent = 0;
        for symbol in self.settings.universe.iter().take(take) {
            let candles = match self
                .candles
                .candles(symbol, &self.settings.interval, self.settings.candle_limit)
                .await
            {
                Ok(candles) => candles,
                Err(e) => {
                    warn!("Skipping {}: candle fetch failed: {}", symbol, e);
                    continue;
                }
            };

            let Some(post) = compose_signal(symbol, &candles, self.settings.equity) else {
                warn!("Skipping {}: only {} candles", symbol, candles.len());
                continue;
            };

            if sent > 0 {
                time::sleep(self.settings.send_delay).await;
            }

            match self.deliver(&post).await {
                Ok(()) => {
                    self.store.increment(QuotaField::Signals).await?;
                    sent += 1;
                    debug!(
                        "Posted {} {} signal at {}",
                        symbol, post.signal.direction, post.signal.entry
                    );
                }
                Err(e) => warn!("Failed to post signal for {}: {}", symbol, e),
            }
        }

        info!("Posted {} signals", sent);
        Ok(sent)
    }

    async fn deliver(&self, post: &SignalPost) -> Result<(), DeliveryError> {
        match self.renderer.render(&post.chart) {
            Some(image) => {
                self.sink
                    .send_photo(self.settings.chat_id, image, &post.text)
                    .await
            }
            None => {
                self.sink
                    .send_text(self.settings.chat_id, &html_escape(&post.text))
                    .await
            }
        }
    }
}

#[async_trait]
impl Job for SignalService {
    fn kind(&self) -> JobKind {
        JobKind::SignalBatch
    }

    async fn run(&self) -> anyhow::Result<()> {
        self.post_batch().await.map(|_| ())
    }
}
