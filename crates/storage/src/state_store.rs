use std::collections::HashSet;

use async_trait::async_trait;

use common::models::{Quota, QuotaField};

use crate::error::StorageError;

/// Daily counters plus the sent-title history. Implementations serialize every
/// read-modify-write so a scheduled job and a manually triggered one cannot interleave.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Today's counters. A record from an earlier date is replaced by zeroed
    /// counters and persisted before returning.
    async fn read(&self) -> Result<Quota, StorageError>;

    async fn increment(&self, field: QuotaField) -> Result<Quota, StorageError>;

    /// Unconditionally writes zeroed counters for today.
    async fn reset(&self) -> Result<Quota, StorageError>;

    async fn read_history(&self) -> Result<HashSet<String>, StorageError>;

    async fn record(&self, title: &str) -> Result<(), StorageError>;
}
