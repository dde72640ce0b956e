use std::sync::Arc;

use tracing::{error, info};

use common::config::DailyLimits;
use common::format::group_thousands;
use market_data::services::PriceService;
use storage::StateStore;

use crate::services::{NewsService, SignalService};

const DISCLAIMER: &str = "Signals are informational only and are not financial advice.";

/// Reply text for every user command. Failures never escape; they turn into
/// an explanatory reply.
pub struct CommandService {
    store: Arc<dyn StateStore>,
    prices: PriceService,
    news: Arc<NewsService>,
    signals: Arc<SignalService>,
    limits: DailyLimits,
}

impl CommandService {
    pub fn new(
        store: Arc<dyn StateStore>,
        prices: PriceService,
        news: Arc<NewsService>,
        signals: Arc<SignalService>,
        limits: DailyLimits,
    ) -> Self {
        Self {
            store,
            prices,
            news,
            signals,
            limits,
        }
    }

    pub fn start_text(&self) -> String {
        format!(
            "👋 Crypto news and signals bot.\n\
             News is posted every few hours, trade signals a few times a day.\n\
             Try /price BTC or /version.\n\n\
             ⚠️ {}",
            DISCLAIMER
        )
    }

    pub async fn version_text(&self) -> String {
        let counters = match self.store.read().await {
            Ok(quota) => format!(
                "📰 News today: {}/{}\n📊 Signals today: {}/{}",
                quota.news,
                self.limits.max_news_per_day,
                quota.signals,
                self.limits.max_signals_per_day
            ),
            Err(e) => {
                error!("Failed to read counters: {}", e);
                "Counters are unavailable right now.".to_string()
            }
        };
        format!(
            "🤖 Version {}\n{}\nPrices: CoinGecko, Binance\nCandles: Binance",
            env!("CARGO_PKG_VERSION"),
            counters
        )
    }

    pub async fn price_text(&self, args: &str) -> String {
        let Some(symbol) = args.split_whitespace().next() else {
            return "Usage: /price BTC".to_string();
        };
        let symbol = symbol.to_uppercase();

        match self.prices.lookup(&symbol).await {
            Some(price) => format!("💰 {}: ${}", symbol, group_thousands(price, 6)),
            None => format!("❌ Could not get a price for {}. Try again later.", symbol),
        }
    }

    pub async fn news_text(&self) -> String {
        info!("Manual news batch requested");
        match self.news.post_batch().await {
            Ok(0) => "Nothing new to post: no fresh headlines or today's limit is reached.".to_string(),
            Ok(n) => format!("✅ Posted {} news item(s).", n),
            Err(e) => {
                error!("Manual news batch failed: {:#}", e);
                "⚠️ The news batch failed, please try again later.".to_string()
            }
        }
    }

    pub async fn signal_text(&self) -> String {
        info!("Manual signal batch requested");
        match self.signals.post_batch().await {
            Ok(0) => "No signals posted: today's limit is reached or no market data.".to_string(),
            Ok(n) => format!("✅ Posted {} signal(s).", n),
            Err(e) => {
                error!("Manual signal batch failed: {:#}", e);
                "⚠️ The signal batch failed, please try again later.".to_string()
            }
        }
    }
}
