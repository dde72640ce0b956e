use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Days, NaiveTime, TimeDelta, Utc};
use futures_util::FutureExt;
use tokio::time;
use tracing::{Instrument, debug, error, info, info_span};
use uuid::Uuid;

use common::jobs::{Job, JobKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Every(Duration),
    /// Once a day at this UTC wall-clock time.
    DailyAt(NaiveTime),
}

impl Trigger {
    /// First fire time strictly after `now`.
    pub fn next_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match *self {
            Trigger::Every(period) => {
                now + TimeDelta::from_std(period).unwrap_or(TimeDelta::days(1))
            }
            Trigger::DailyAt(at) => {
                let today = now.date_naive().and_time(at).and_utc();
                if today > now {
                    today
                } else {
                    today.checked_add_days(Days::new(1)).unwrap_or(today)
                }
            }
        }
    }
}

struct ScheduledJob {
    job: Arc<dyn Job>,
    trigger: Trigger,
    next_run: DateTime<Utc>,
    run_at_startup: bool,
}

/// Cooperative single-loop scheduler. Jobs run one at a time and a failing or
/// panicking job never stops the loop.
pub struct Scheduler {
    jobs: Vec<ScheduledJob>,
    tick: Duration,
    startup_delay: Duration,
}

impl Scheduler {
    pub fn new(tick: Duration, startup_delay: Duration) -> Self {
        Self {
            jobs: Vec::new(),
            tick,
            startup_delay,
        }
    }

    /// Jobs flagged `run_at_startup` also run once, in registration order,
    /// before the first tick.
    pub fn register(&mut self, trigger: Trigger, job: Arc<dyn Job>, run_at_startup: bool) {
        let next_run = trigger.next_after(Utc::now());
        debug!("Registered {} job, first run at {}", job.kind(), next_run);
        self.jobs.push(ScheduledJob {
            job,
            trigger,
            next_run,
            run_at_startup,
        });
    }

    pub fn next_run(&self, kind: JobKind) -> Option<DateTime<Utc>> {
        self.jobs
            .iter()
            .find(|scheduled| scheduled.job.kind() == kind)
            .map(|scheduled| scheduled.next_run)
    }

    /// Returns how many jobs ran, failed ones included.
    pub async fn run_startup(&self) -> usize {
        let mut ran = 0;
        let mut failed = 0;
        for scheduled in self.jobs.iter().filter(|s| s.run_at_startup) {
            if !run_guarded(scheduled.job.as_ref()).await {
                failed += 1;
            }
            ran += 1;
        }
        info!("Startup pass ran {} jobs, {} failed", ran, failed);
        ran
    }

    /// Runs every job due at `now` and schedules its next run. Returns how many ran,
    /// failed ones included.
    pub async fn run_pending(&mut self, now: DateTime<Utc>) -> usize {
        let mut ran = 0;
        let mut failed = 0;
        for scheduled in self.jobs.iter_mut() {
            if scheduled.next_run > now {
                continue;
            }
            if !run_guarded(scheduled.job.as_ref()).await {
                failed += 1;
            }
            scheduled.next_run = scheduled.trigger.next_after(now);
            ran += 1;
        }
        if ran > 0 {
            debug!("Tick ran {} jobs, {} failed", ran, failed);
        }
        ran
    }

    pub async fn start(mut self) {
        info!(
            "Scheduler started with {} jobs, first pass in {:?}",
            self.jobs.len(),
            self.startup_delay
        );
        time::sleep(self.startup_delay).await;
        self.run_startup().await;

        loop {
            self.run_pending(Utc::now()).await;
            time::sleep(self.tick).await;
        }
    }
}

/// Runs one job inside its own span; returns whether it completed cleanly.
async fn run_guarded(job: &dyn Job) -> bool {
    let kind = job.kind();
    let span = info_span!("job", kind = %kind, run_id = %Uuid::new_v4());
    let started = time::Instant::now();

    let outcome = AssertUnwindSafe(job.run())
        .catch_unwind()
        .instrument(span.clone())
        .await;

    let _guard = span.enter();
    match outcome {
        Ok(Ok(())) => {
            debug!("Job {} finished in {:?}", kind, started.elapsed());
            true
        }
        Ok(Err(e)) => {
            error!("Job {} failed: {:#}", kind, e);
            false
        }
        Err(panic) => {
            error!("Job {} panicked: {}", kind, panic_message(panic.as_ref()));
            false
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}
