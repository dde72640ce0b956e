use std::collections::HashSet;

use chrono::{DateTime, Utc};

use common::models::{FeedItem, NewsItem};

/// Freshness, relevance and dedup rules for outgoing news.
#[derive(Debug, Clone)]
pub struct NewsFilter {
    window_hours: f64,
    // Stored uppercased; titles are uppercased before matching.
    keywords: Vec<String>,
    per_run_cap: usize,
}

impl NewsFilter {
    pub fn new(window_hours: f64, keywords: &[String], per_run_cap: usize) -> Self {
        Self {
            window_hours,
            keywords: keywords
                .iter()
                .map(|k| k.trim().to_uppercase())
                .filter(|k| !k.is_empty())
                .collect(),
            per_run_cap,
        }
    }

    /// Case-insensitive substring match against any keyword.
    pub fn is_relevant(&self, title: &str) -> bool {
        let title = title.to_uppercase();
        self.keywords.iter().any(|k| title.contains(k.as_str()))
    }

    /// Keeps fresh, relevant, unsent items, freshest first, at most
    /// `min(remaining_quota, per_run_cap)` of them.
    pub fn select(
        &self,
        items: Vec<FeedItem>,
        now: DateTime<Utc>,
        history: &HashSet<String>,
        remaining_quota: usize,
    ) -> Vec<NewsItem> {
        let limit = remaining_quota.min(self.per_run_cap);
        if limit == 0 {
            return Vec::new();
        }

        let mut seen = HashSet::new();
        let mut selected: Vec<NewsItem> = items
            .into_iter()
            .filter(|item| !item.title.trim().is_empty() && !item.link.trim().is_empty())
            .map(|item| NewsItem {
                age_hours: item.age_hours(now),
                title: item.title,
                link: item.link,
            })
            .filter(|item| item.age_hours <= self.window_hours)
            .filter(|item| self.is_relevant(&item.title))
            .filter(|item| !history.contains(&item.title))
            .filter(|item| seen.insert(item.title.clone()))
            .collect();

        selected.sort_by(|a, b| a.age_hours.total_cmp(&b.age_hours));
        selected.truncate(limit);
        selected
    }
}
