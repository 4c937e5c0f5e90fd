use chrono::{Duration as ChronoDuration, Local, NaiveDateTime, NaiveTime};
use log::{debug, info};
use std::future::Future;
use std::time::Duration;

/// 两次检查之间的等待时间
pub const POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Fires a job once per calendar day at a fixed wall-clock time.
#[derive(Debug, Clone)]
pub struct DailyScheduler {
    run_at: NaiveTime,
    next_run: NaiveDateTime,
}

impl DailyScheduler {
    /// The first scheduled run is the next occurrence of `run_at` strictly after `now`.
    pub fn new(run_at: NaiveTime, now: NaiveDateTime) -> Self {
        Self {
            run_at,
            next_run: next_occurrence(run_at, now),
        }
    }

    pub fn next_run(&self) -> NaiveDateTime {
        self.next_run
    }

    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        now >= self.next_run
    }

    // 执行后推进到下一次，迟到的检查也只触发一次
    pub fn mark_ran(&mut self, now: NaiveDateTime) {
        self.next_run = next_occurrence(self.run_at, now);
    }

    /// Poll forever, running `job` whenever it is due and sleeping `poll_interval` between checks.
    ///
    /// The job is awaited before the next check, so runs never overlap.
    pub async fn run_forever<F, Fut>(&mut self, mut job: F, poll_interval: Duration)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ()>,
    {
        info!("Scheduler started, next run at {}", self.next_run);
        loop {
            let now = Local::now().naive_local();
            if self.is_due(now) {
                job().await;
                self.mark_ran(Local::now().naive_local());
                info!("Next run at {}", self.next_run);
            } else {
                debug!("Not due yet, next run at {}", self.next_run);
            }
            tokio::time::sleep(poll_interval).await;
        }
    }
}

fn next_occurrence(run_at: NaiveTime, now: NaiveDateTime) -> NaiveDateTime {
    let today = now.date().and_time(run_at);
    if today > now {
        today
    } else {
        today + ChronoDuration::days(1)
    }
}
