use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuotaField {
    News,
    Signals,
}

/// Daily counters, one record per calendar day. Serialized as
/// `{"date": "YYYY-MM-DD", "news": n, "signals": n}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quota {
    pub date: NaiveDate,
    #[serde(default)]
    pub news: u32,
    #[serde(default)]
    pub signals: u32,
}

impl Quota {
    pub fn fresh(date: NaiveDate) -> Self {
        Self {
            date,
            news: 0,
            signals: 0,
        }
    }

    pub fn get(&self, field: QuotaField) -> u32 {
        match field {
            QuotaField::News => self.news,
            QuotaField::Signals => self.signals,
        }
    }

    pub fn bump(&mut self, field: QuotaField) {
        match field {
            QuotaField::News => self.news = self.news.saturating_add(1),
            QuotaField::Signals => self.signals = self.signals.saturating_add(1),
        }
    }

    pub fn remaining(&self, field: QuotaField, max: u32) -> u32 {
        max.saturating_sub(self.get(field))
    }
}
