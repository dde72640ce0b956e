use dotenvy::dotenv;
use std::sync::Arc;
use teloxide::Bot;
use tracing::{debug, info};

use common::config::BotConfig;
use common::logger;
use common::traits::{ChartRenderer, IdentityTranslator, MessageSink, NoChart, Translator};
use executor::scheduler::{Scheduler, Trigger};
use executor::services::{
    CommandService, NewsService, NewsSettings, QuotaResetJob, SignalService, SignalSettings,
    TelegramService, telegram_service,
};
use market_data::SpotPriceSource;
use market_data::remote::{BinanceClient, CoinGeckoClient, RssFeedClient, build_http_client};
use market_data::services::PriceService;
use storage::{HistoryLimits, JsonStateStore, StateStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logger::setup_logger();
    dotenv().ok();
    debug!("System starting up...");

    let config = BotConfig::from_env()?;
    info!(
        "Crypto news bot v{}: {} feeds, {} symbols, state in {}",
        env!("CARGO_PKG_VERSION"),
        config.news.feeds.len(),
        config.signals.universe.len(),
        config.state.dir.display()
    );

    let http = build_http_client(config.http_timeout)?;
    let binance = Arc::new(BinanceClient::new(http.clone()));
    let coingecko: Arc<dyn SpotPriceSource> = Arc::new(CoinGeckoClient::new(http.clone()));
    let feeds = Arc::new(RssFeedClient::new(http, config.news.items_per_feed));

    let store: Arc<dyn StateStore> = Arc::new(JsonStateStore::new(
        &config.state.dir,
        HistoryLimits {
            max: config.state.history_max,
            retain: config.state.history_retain,
        },
    ));

    let bot = Bot::new(config.bot_token.clone());
    let sink: Arc<dyn MessageSink> = Arc::new(TelegramService::new(bot.clone()));
    let translator: Arc<dyn Translator> = Arc::new(IdentityTranslator);
    let renderer: Arc<dyn ChartRenderer> = Arc::new(NoChart);

    let news = Arc::new(NewsService::new(
        store.clone(),
        feeds,
        translator,
        sink.clone(),
        NewsSettings::from_config(&config),
    ));
    let signals = Arc::new(SignalService::new(
        store.clone(),
        binance.clone(),
        renderer,
        sink,
        SignalSettings::from_config(&config),
    ));

    let mut scheduler = Scheduler::new(config.schedule.tick, config.schedule.startup_delay);
    scheduler.register(Trigger::Every(config.schedule.news_every), news.clone(), true);
    scheduler.register(Trigger::Every(config.schedule.signals_every), signals.clone(), true);
    scheduler.register(
        Trigger::DailyAt(config.schedule.daily_reset_at),
        Arc::new(QuotaResetJob::new(store.clone())),
        false,
    );

    let binance_quotes: Arc<dyn SpotPriceSource> = binance;
    let prices = PriceService::new(vec![coingecko, binance_quotes]);
    let commands = Arc::new(CommandService::new(
        store,
        prices,
        news,
        signals,
        config.limits,
    ));

    tokio::spawn(scheduler.start());
    telegram_service::run_commands(bot, commands).await;

    info!("Command listener stopped, shutting down");
    Ok(())
}
