use std::fmt;

use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    NewsBatch,
    SignalBatch,
    QuotaReset,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NewsBatch => write!(f, "news-batch"),
            Self::SignalBatch => write!(f, "signal-batch"),
            Self::QuotaReset => write!(f, "quota-reset"),
        }
    }
}

/// The trait that every scheduled job implements.
#[async_trait]
pub trait Job: Send + Sync {
    fn kind(&self) -> JobKind;

    /// One complete run. Errors are logged by the scheduler and the job is
    /// simply tried again on its next tick.
    async fn run(&self) -> anyhow::Result<()>;
}
