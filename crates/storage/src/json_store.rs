use std::collections::HashSet;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde::{Serialize, de::DeserializeOwned};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use common::models::{Quota, QuotaField};

use crate::error::StorageError;
use crate::state_store::StateStore;

pub const QUOTA_FILE: &str = "quota.json";
pub const HISTORY_FILE: &str = "sent_posts.json";

/// Once the history grows past `max` titles only the newest `retain` are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryLimits {
    pub max: usize,
    pub retain: usize,
}

impl Default for HistoryLimits {
    fn default() -> Self {
        Self {
            max: 1500,
            retain: 800,
        }
    }
}

type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// Quota and history kept as two small JSON files. Every write goes to a
/// sibling `.tmp` file that is then renamed over the target.
pub struct JsonStateStore {
    quota_path: PathBuf,
    history_path: PathBuf,
    limits: HistoryLimits,
    today: Clock,
    // Guards both files.
    lock: Mutex<()>,
}

impl JsonStateStore {
    pub fn new(dir: impl AsRef<Path>, limits: HistoryLimits) -> Self {
        let dir = dir.as_ref();
        Self {
            quota_path: dir.join(QUOTA_FILE),
            history_path: dir.join(HISTORY_FILE),
            limits,
            today: Arc::new(|| Utc::now().date_naive()),
            lock: Mutex::new(()),
        }
    }

    pub fn with_clock(mut self, today: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        self.today = Arc::new(today);
        self
    }

    pub fn quota_path(&self) -> &Path {
        &self.quota_path
    }

    pub fn history_path(&self) -> &Path {
        &self.history_path
    }

    /// Loads the quota and rolls it over to `today` if needed. Caller holds the lock.
    async fn load_quota(&self, today: NaiveDate) -> Result<Quota, StorageError> {
        let stored = match read_json::<Quota>(&self.quota_path).await {
            Ok(stored) => stored,
            Err(StorageError::Corrupt { path, source }) => {
                warn!("Discarding unreadable quota file {}: {}", path.display(), source);
                None
            }
            Err(e) => return Err(e),
        };

        match stored {
            Some(quota) if quota.date == today => Ok(quota),
            Some(stale) => {
                info!(
                    "New day {} (stored {}), resetting counters",
                    today, stale.date
                );
                let fresh = Quota::fresh(today);
                write_json_atomic(&self.quota_path, &fresh).await?;
                Ok(fresh)
            }
            None => Ok(Quota::fresh(today)),
        }
    }

    async fn load_history(&self) -> Result<Vec<String>, StorageError> {
        match read_json::<Vec<String>>(&self.history_path).await {
            Ok(history) => Ok(history.unwrap_or_default()),
            Err(StorageError::Corrupt { path, source }) => {
                warn!("Discarding unreadable history file {}: {}", path.display(), source);
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl StateStore for JsonStateStore {
    async fn read(&self) -> Result<Quota, StorageError> {
        let _guard = self.lock.lock().await;
        self.load_quota((self.today)()).await
    }

    async fn increment(&self, field: QuotaField) -> Result<Quota, StorageError> {
        let _guard = self.lock.lock().await;
        let mut quota = self.load_quota((self.today)()).await?;
        quota.bump(field);
        write_json_atomic(&self.quota_path, &quota).await?;
        debug!("Quota now news={} signals={}", quota.news, quota.signals);
        Ok(quota)
    }

    async fn reset(&self) -> Result<Quota, StorageError> {
        let _guard = self.lock.lock().await;
        let fresh = Quota::fresh((self.today)());
        write_json_atomic(&self.quota_path, &fresh).await?;
        info!("Daily counters reset for {}", fresh.date);
        Ok(fresh)
    }

    async fn read_history(&self) -> Result<HashSet<String>, StorageError> {
        let _guard = self.lock.lock().await;
        Ok(self.load_history().await?.into_iter().collect())
    }

    async fn record(&self, title: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let mut history = self.load_history().await?;
        if history.iter().any(|t| t == title) {
            return Ok(());
        }

        history.push(title.to_string());
        if history.len() > self.limits.max {
            let excess = history.len() - self.limits.retain.min(history.len());
            history.drain(..excess);
            debug!("History trimmed to {} titles", history.len());
        }
        write_json_atomic(&self.history_path, &history).await
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StorageError> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StorageError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| StorageError::Corrupt {
            path: path.to_path_buf(),
            source,
        })
}

async fn write_json_atomic<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> Result<(), StorageError> {
    let bytes = serde_json::to_vec(value)?;
    let tmp = tmp_path(path);
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| StorageError::Io { path, source }
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await.map_err(io_err(parent))?;
    }

    let mut file = fs::File::create(&tmp).await.map_err(io_err(&tmp))?;
    file.write_all(&bytes).await.map_err(io_err(&tmp))?;
    file.sync_all().await.map_err(io_err(&tmp))?;
    drop(file);

    fs::rename(&tmp, path).await.map_err(io_err(path))
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("state"));
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;
    use tempfile::TempDir;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, d).unwrap()
    }

    fn store_on(dir: &TempDir, date: Arc<StdMutex<NaiveDate>>) -> JsonStateStore {
        JsonStateStore::new(dir.path(), HistoryLimits::default())
            .with_clock(move || *date.lock().unwrap())
    }

    #[tokio::test]
    async fn missing_file_reads_as_zero_for_today() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_on(&dir, Arc::new(StdMutex::new(day(18))));

        let quota = store.read().await.unwrap();
        assert_eq!(quota, Quota::fresh(day(18)));
    }

    #[tokio::test]
    async fn same_date_reads_leave_the_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_on(&dir, Arc::new(StdMutex::new(day(18))));
        store.increment(QuotaField::News).await.unwrap();
        let before = std::fs::read(store.quota_path()).unwrap();

        for _ in 0..3 {
            let quota = store.read().await.unwrap();
            assert_eq!(quota.news, 1);
        }
        assert_eq!(std::fs::read(store.quota_path()).unwrap(), before);
    }

    #[tokio::test]
    async fn new_date_resets_once_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let date = Arc::new(StdMutex::new(day(17)));
        let store = store_on(&dir, date.clone());
        store.increment(QuotaField::News).await.unwrap();
        store.increment(QuotaField::Signals).await.unwrap();

        *date.lock().unwrap() = day(18);
        let quota = store.read().await.unwrap();
        assert_eq!(quota, Quota::fresh(day(18)));

        let on_disk: Quota =
            serde_json::from_slice(&std::fs::read(store.quota_path()).unwrap()).unwrap();
        assert_eq!(on_disk, Quota::fresh(day(18)));

        store.increment(QuotaField::News).await.unwrap();
        assert_eq!(store.read().await.unwrap().news, 1);
    }

    #[tokio::test]
    async fn counters_survive_a_new_store_instance() {
        let dir = tempfile::tempdir().unwrap();
        let date = Arc::new(StdMutex::new(day(18)));
        {
            let store = store_on(&dir, date.clone());
            store.increment(QuotaField::Signals).await.unwrap();
            store.increment(QuotaField::Signals).await.unwrap();
        }
        let store = store_on(&dir, date);
        assert_eq!(store.read().await.unwrap().signals, 2);
    }

    #[tokio::test]
    async fn reset_zeroes_counters() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_on(&dir, Arc::new(StdMutex::new(day(18))));
        store.increment(QuotaField::News).await.unwrap();

        assert_eq!(store.reset().await.unwrap(), Quota::fresh(day(18)));
        assert_eq!(store.read().await.unwrap().news, 0);
    }

    #[tokio::test]
    async fn corrupt_quota_file_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_on(&dir, Arc::new(StdMutex::new(day(18))));
        std::fs::write(store.quota_path(), b"{not json").unwrap();

        assert_eq!(store.read().await.unwrap(), Quota::fresh(day(18)));
        assert_eq!(store.increment(QuotaField::News).await.unwrap().news, 1);
    }

    #[tokio::test]
    async fn writes_leave_no_temporary_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_on(&dir, Arc::new(StdMutex::new(day(18))));
        store.increment(QuotaField::News).await.unwrap();
        store.record("Bitcoin hits new high").await.unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert!(names.iter().all(|n| !n.ends_with(".tmp")), "{:?}", names);
        assert!(names.contains(&QUOTA_FILE.to_string()));
        assert!(names.contains(&HISTORY_FILE.to_string()));
    }

    #[tokio::test]
    async fn history_records_each_title_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_on(&dir, Arc::new(StdMutex::new(day(18))));
        store.record("ETF approved").await.unwrap();
        store.record("ETF approved").await.unwrap();
        store.record("SEC delays decision").await.unwrap();

        let raw: Vec<String> =
            serde_json::from_slice(&std::fs::read(store.history_path()).unwrap()).unwrap();
        assert_eq!(raw, vec!["ETF approved", "SEC delays decision"]);
        assert!(store.read_history().await.unwrap().contains("ETF approved"));
    }

    #[tokio::test]
    async fn history_evicts_oldest_past_the_cap() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStateStore::new(dir.path(), HistoryLimits { max: 5, retain: 3 })
            .with_clock(|| NaiveDate::from_ymd_opt(2025, 10, 18).unwrap());

        for i in 0..6 {
            store.record(&format!("title {}", i)).await.unwrap();
        }

        let raw: Vec<String> =
            serde_json::from_slice(&std::fs::read(store.history_path()).unwrap()).unwrap();
        assert_eq!(raw, vec!["title 3", "title 4", "title 5"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_increments_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(store_on(&dir, Arc::new(StdMutex::new(day(18)))));

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.increment(QuotaField::News).await.unwrap() })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.read().await.unwrap().news, 20);
    }
}
