use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw feed entry as returned by a news source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub published_at: DateTime<Utc>,
}

impl FeedItem {
    pub fn age_hours(&self, now: DateTime<Utc>) -> f64 {
        (now - self.published_at).num_seconds() as f64 / 3600.0
    }
}

/// A feed entry that passed freshness, relevance and dedup checks.
/// Identity for dedup purposes is the exact title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub link: String,
    pub age_hours: f64,
}
