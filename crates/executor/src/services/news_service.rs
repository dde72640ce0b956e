use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tokio::time;
use tracing::{debug, info, warn};

use common::config::BotConfig;
use common::format::html_escape;
use common::jobs::{Job, JobKind};
use common::models::{NewsItem, QuotaField};
use common::traits::{MessageSink, Translator};
use market_data::NewsFeedSource;
use storage::StateStore;
use strategy::NewsFilter;
use strategy::commentary::commentary;

#[derive(Debug, Clone)]
pub struct NewsSettings {
    pub chat_id: i64,
    pub feeds: Vec<String>,
    pub keywords: Vec<String>,
    pub window_hours: f64,
    pub per_run_cap: usize,
    pub max_per_day: u32,
    pub send_delay: Duration,
}

impl NewsSettings {
    pub fn from_config(config: &BotConfig) -> Self {
        Self {
            chat_id: config.news.chat_id,
            feeds: config.news.feeds.iter().map(|u| u.to_string()).collect(),
            keywords: config.news.keywords.clone(),
            window_hours: config.news.window_hours,
            per_run_cap: config.news.per_run_cap,
            max_per_day: config.limits.max_news_per_day,
            send_delay: config.news.send_delay,
        }
    }
}

/// Collects headlines from every feed and posts the fresh, relevant, unsent
/// ones to the news channel within the daily quota.
pub struct NewsService {
    store: Arc<dyn StateStore>,
    feeds: Arc<dyn NewsFeedSource>,
    translator: Arc<dyn Translator>,
    sink: Arc<dyn MessageSink>,
    filter: NewsFilter,
    settings: NewsSettings,
    // Held for a whole batch so a manual run cannot interleave with a scheduled one.
    batch_lock: Mutex<()>,
}

impl NewsService {
    pub fn new(
        store: Arc<dyn StateStore>,
        feeds: Arc<dyn NewsFeedSource>,
        translator: Arc<dyn Translator>,
        sink: Arc<dyn MessageSink>,
        settings: NewsSettings,
    ) -> Self {
        let filter = NewsFilter::new(
            settings.window_hours,
            &settings.keywords,
            settings.per_run_cap,
        );
        Self {
            store,
            feeds,
            translator,
            sink,
            filter,
            settings,
            batch_lock: Mutex::new(()),
        }
    }

    /// Posts one batch and returns how many items were delivered.
    pub async fn post_batch(&self) -> anyhow::Result<usize> {
        let _batch = self.batch_lock.lock().await;
        let quota = self.store.read().await?;
        let remaining = quota.remaining(QuotaField::News, self.settings.max_per_day);
        if remaining == 0 {
            info!(
                "News quota reached ({}/{}), skipping batch",
                quota.news, self.settings.max_per_day
            );
            return Ok(0);
        }

        let history = self.store.read_history().await?;
        let mut collected = Vec::new();
        for url in &self.settings.feeds {
            match self.feeds.fetch(url).await {
                Ok(items) => collected.extend(items),
                Err(e) => warn!("Skipping feed {}: {}", url, e),
            }
        }
        debug!("Collected {} headlines from {} feeds", collected.len(), self.settings.feeds.len());

        let batch = self
            .filter
            .select(collected, Utc::now(), &history, remaining as usize);
        if batch.is_empty() {
            info!("No fresh news to post");
            return Ok(0);
        }

        let mut sent = 0;
        for item in &batch {
            if sent > 0 {
                time::sleep(self.settings.send_delay).await;
            }

            let message = self.render(item).await;
            match self.sink.send_text(self.settings.chat_id, &message).await {
                Ok(()) => {
                    self.store.record(&item.title).await?;
                    self.store.increment(QuotaField::News).await?;
                    sent += 1;
                    debug!("Posted news: {}", item.title);
                }
                Err(e) => warn!("Failed to post news {:?}: {}", item.title, e),
            }
        }

        info!("Posted {} of {} selected news items", sent, batch.len());
        Ok(sent)
    }

    async fn render(&self, item: &NewsItem) -> String {
        let title = self.translator.translate(&item.title).await;
        format!(
            "📰 {}\n🔗 <a href=\"{}\">Source</a>\n#CryptoNews\n\n{}",
            html_escape(&title),
            html_escape(&item.link),
            html_escape(&commentary(&item.title)),
        )
    }
}

#[async_trait]
impl Job for NewsService {
    fn kind(&self) -> JobKind {
        JobKind::NewsBatch
    }

    async fn run(&self) -> anyhow::Result<()> {
        self.post_batch().await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{
        MockFeeds, MockSink, SlowSink, fresh_item, recording_sink, temp_store,
    };
    use common::traits::{DeliveryError, IdentityTranslator};
    use market_data::MarketDataError;
    use tempfile::tempdir;

    fn settings(feeds: &[&str]) -> NewsSettings {
        NewsSettings {
            chat_id: -100,
            feeds: feeds.iter().map(|f| f.to_string()).collect(),
            keywords: vec!["BTC".into(), "bitcoin".into(), "etf".into()],
            window_hours: 4.0,
            per_run_cap: 30,
            max_per_day: 7,
            send_delay: Duration::ZERO,
        }
    }

    fn feeds_returning(items: Vec<common::models::FeedItem>) -> MockFeeds {
        let mut feeds = MockFeeds::new();
        feeds.expect_fetch().returning(move |_| Ok(items.clone()));
        feeds
    }

    fn service(
        store: Arc<dyn StateStore>,
        feeds: MockFeeds,
        sink: MockSink,
        settings: NewsSettings,
    ) -> NewsService {
        NewsService::new(
            store,
            Arc::new(feeds),
            Arc::new(IdentityTranslator),
            Arc::new(sink),
            settings,
        )
    }

    #[tokio::test]
    async fn exhausted_quota_sends_nothing() {
        let dir = tempdir().unwrap();
        let store = temp_store(&dir);
        for _ in 0..7 {
            store.increment(QuotaField::News).await.unwrap();
        }

        let mut feeds = MockFeeds::new();
        feeds.expect_fetch().never();
        let mut sink = MockSink::new();
        sink.expect_send_text().never();

        let news = service(store, feeds, sink, settings(&["https://a.example/rss"]));
        assert_eq!(news.post_batch().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn posts_freshest_first_within_remaining_quota() {
        let dir = tempdir().unwrap();
        let store = temp_store(&dir);
        for _ in 0..5 {
            store.increment(QuotaField::News).await.unwrap();
        }

        let feeds = feeds_returning(vec![
            fresh_item("Bitcoin miners sell", 90),
            fresh_item("BTC breaks 70k", 10),
            fresh_item("ETF flows turn positive", 45),
            fresh_item("Gold ticks higher", 5),
        ]);
        let (sink, outbox) = recording_sink();

        let news = service(store.clone(), feeds, sink, settings(&["https://a.example/rss"]));
        assert_eq!(news.post_batch().await.unwrap(), 2);

        let sent = outbox.lock().unwrap().clone();
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|(chat, _)| *chat == -100));
        assert!(sent[0].1.starts_with("📰 BTC breaks 70k"));
        assert!(sent[1].1.starts_with("📰 ETF flows turn positive"));

        assert_eq!(store.read().await.unwrap().news, 7);
        let history = store.read_history().await.unwrap();
        assert!(history.contains("BTC breaks 70k"));
        assert!(!history.contains("Bitcoin miners sell"));
    }

    #[tokio::test]
    async fn second_run_does_not_repeat_titles() {
        let dir = tempdir().unwrap();
        let store = temp_store(&dir);
        let feeds = feeds_returning(vec![fresh_item("BTC breaks 70k", 10), fresh_item("Bitcoin dips", 20)]);
        let (sink, outbox) = recording_sink();

        let news = service(store.clone(), feeds, sink, settings(&["https://a.example/rss"]));
        assert_eq!(news.post_batch().await.unwrap(), 2);
        assert_eq!(news.post_batch().await.unwrap(), 0);

        assert_eq!(outbox.lock().unwrap().len(), 2);
        assert_eq!(store.read().await.unwrap().news, 2);
    }

    #[tokio::test]
    async fn failing_feed_is_skipped() {
        let dir = tempdir().unwrap();
        let store = temp_store(&dir);

        let mut feeds = MockFeeds::new();
        feeds
            .expect_fetch()
            .withf(|url| url.contains("broken"))
            .returning(|_| Err(MarketDataError::Malformed("not xml".into())));
        feeds
            .expect_fetch()
            .withf(|url| url.contains("good"))
            .returning(|_| Ok(vec![fresh_item("Bitcoin ETF approved", 15)]));
        let (sink, outbox) = recording_sink();

        let news = service(
            store,
            feeds,
            sink,
            settings(&["https://broken.example/rss", "https://good.example/rss"]),
        );
        assert_eq!(news.post_batch().await.unwrap(), 1);
        assert_eq!(outbox.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_delivery_is_not_counted() {
        let dir = tempdir().unwrap();
        let store = temp_store(&dir);
        let feeds = feeds_returning(vec![fresh_item("BTC breaks 70k", 10)]);

        let mut sink = MockSink::new();
        sink.expect_send_text()
            .times(1)
            .returning(|_, _| Err(DeliveryError::Unavailable("timeout".into())));

        let news = service(store.clone(), feeds, sink, settings(&["https://a.example/rss"]));
        assert_eq!(news.post_batch().await.unwrap(), 0);
        assert_eq!(store.read().await.unwrap().news, 0);
        assert!(store.read_history().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn message_is_escaped_and_annotated() {
        let dir = tempdir().unwrap();
        let store = temp_store(&dir);
        let mut item = fresh_item("Bitcoin <ETF> surges & more", 10);
        item.link = "https://wire.example/a?x=1&y=2".into();
        let feeds = feeds_returning(vec![item]);
        let (sink, outbox) = recording_sink();

        let news = service(store, feeds, sink, settings(&["https://a.example/rss"]));
        news.post_batch().await.unwrap();

        let text = outbox.lock().unwrap()[0].1.clone();
        assert!(text.starts_with("📰 Bitcoin &lt;ETF&gt; surges &amp; more\n"));
        assert!(text.contains("<a href=\"https://wire.example/a?x=1&amp;y=2\">Source</a>"));
        assert!(text.contains("#CryptoNews"));
        assert!(text.ends_with("Positive for BTC: an upward move is possible."));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn overlapping_batches_share_the_quota() {
        let dir = tempdir().unwrap();
        let store = temp_store(&dir);
        for _ in 0..6 {
            store.increment(QuotaField::News).await.unwrap();
        }

        let feeds = feeds_returning(vec![fresh_item("BTC breaks 70k", 10)]);
        let (sink, outbox) = SlowSink::new(Duration::from_millis(50));
        let news = Arc::new(NewsService::new(
            store.clone(),
            Arc::new(feeds),
            Arc::new(IdentityTranslator),
            Arc::new(sink),
            settings(&["https://a.example/rss"]),
        ));

        let scheduled = tokio::spawn({
            let news = news.clone();
            async move { news.post_batch().await.unwrap() }
        });
        let manual = tokio::spawn({
            let news = news.clone();
            async move { news.post_batch().await.unwrap() }
        });
        let (a, b) = tokio::join!(scheduled, manual);

        assert_eq!(a.unwrap() + b.unwrap(), 1);
        assert_eq!(outbox.lock().unwrap().len(), 1);
        assert_eq!(store.read().await.unwrap().news, 7);
    }
}
