use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use common::jobs::{Job, JobKind};
use storage::StateStore;

/// Zeroes both daily counters.
pub struct QuotaResetJob {
    store: Arc<dyn StateStore>,
}

impl QuotaResetJob {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Job for QuotaResetJob {
    fn kind(&self) -> JobKind {
        JobKind::QuotaReset
    }

    async fn run(&self) -> anyhow::Result<()> {
        let quota = self.store.reset().await?;
        info!("Daily counters reset for {}", quota.date);
        Ok(())
    }
}
