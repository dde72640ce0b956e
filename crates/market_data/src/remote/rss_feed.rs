use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::Client;
use rss::Channel;
use tracing::debug;

use common::models::FeedItem;

use crate::error::MarketDataError;
use crate::remote::ensure_success;
use crate::traits::NewsFeedSource;

pub struct RssFeedClient {
    client: Client,
    items_per_feed: usize,
}

impl RssFeedClient {
    pub fn new(client: Client, items_per_feed: usize) -> Self {
        Self {
            client,
            items_per_feed,
        }
    }
}

#[async_trait]
impl NewsFeedSource for RssFeedClient {
    async fn fetch(&self, url: &str) -> Result<Vec<FeedItem>, MarketDataError> {
        let response = self.client.get(url).send().await?;
        let body = ensure_success(response).await?.text().await?;
        let items = parse_feed(&body, self.items_per_feed)?;
        debug!("Parsed {} items from {}", items.len(), url);
        Ok(items)
    }
}

/// Parses an RSS 2.0 document. Only the first `max_items` entries are considered;
/// entries without a title, link, or readable publish date are skipped.
pub fn parse_feed(xml: &str, max_items: usize) -> Result<Vec<FeedItem>, MarketDataError> {
    let channel = Channel::read_from(xml.as_bytes())?;

    let items = channel
        .items()
        .iter()
        .take(max_items)
        .filter_map(|item| {
            let title = item.title()?.trim();
            let link = item.link()?.trim();
            if title.is_empty() || link.is_empty() {
                return None;
            }
            let published_at = parse_pub_date(item.pub_date()?)?;
            Some(FeedItem {
                title: title.to_string(),
                link: link.to_string(),
                published_at,
            })
        })
        .collect();

    Ok(items)
}

/// Accepts RFC 2822 (`Sat, 18 Oct 2025 00:24:00 +0000`), RFC 3339, and as a last
/// resort the bare `%a, %d %b %Y %H:%M:%S` prefix read as UTC.
pub fn parse_pub_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    let prefix = raw.get(..25).unwrap_or(raw);
    NaiveDateTime::parse_from_str(prefix, "%a, %d %b %Y %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}
