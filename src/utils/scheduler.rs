use super::time::{calculate_wait_duration, next_daily_time};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration as TokioDuration};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

struct ScheduledJob {
    hour: u32,
    minute: u32,
    tz: Tz,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Daily jobs, at most one per unique name
///
/// Scheduling under a name that already has a job cancels the pending one and
/// replaces it.
#[derive(Default)]
pub struct ScheduleRegistry {
    jobs: Mutex<HashMap<String, ScheduledJob>>,
}

impl ScheduleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `job` every day at `hour:minute` in `tz`
    pub fn schedule<F, Fut>(&self, name: &str, hour: u32, minute: u32, tz: Tz, job: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_daily(
            name.to_string(),
            hour,
            minute,
            tz,
            cancel.clone(),
            job,
        ));

        let previous = self.lock().insert(
            name.to_string(),
            ScheduledJob {
                hour,
                minute,
                tz,
                cancel,
                task,
            },
        );

        if let Some(previous) = previous {
            info!("Replacing pending schedule '{}'", name);
            previous.cancel.cancel();
        }
    }

    /// Cancel the job registered under `name`
    pub fn cancel(&self, name: &str) -> bool {
        match self.lock().remove(name) {
            Some(job) => {
                job.cancel.cancel();
                info!("Cancelled schedule '{}'", name);
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&self) {
        for (name, job) in self.lock().drain() {
            job.cancel.cancel();
            info!("Cancelled schedule '{}'", name);
        }
    }

    pub fn is_scheduled(&self, name: &str) -> bool {
        self.lock()
            .get(name)
            .map(|job| !job.task.is_finished())
            .unwrap_or(false)
    }

    /// Number of registered jobs
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// When the job under `name` fires next
    pub fn next_run(&self, name: &str) -> Option<DateTime<Tz>> {
        let jobs = self.lock();
        let job = jobs.get(name)?;
        let now = Utc::now().with_timezone(&job.tz);
        next_daily_time(&now, job.hour, job.minute)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, ScheduledJob>> {
        // A panic while holding the lock leaves the map itself consistent
        self.jobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for ScheduleRegistry {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

/// Main scheduler loop that waits for the daily time and runs the job
async fn run_daily<F, Fut>(
    name: String,
    hour: u32,
    minute: u32,
    tz: Tz,
    cancel: CancellationToken,
    job: F,
) where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    loop {
        let now = Utc::now().with_timezone(&tz);
        let next = match next_daily_time(&now, hour, minute) {
            Some(next) => next,
            None => {
                error!("Invalid schedule time {:02}:{:02} for '{}'", hour, minute, name);
                return;
            }
        };

        info!("Next '{}' run scheduled for {}", name, next);
        let wait_seconds = calculate_wait_duration(&now, &next);

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = sleep(TokioDuration::from_secs(wait_seconds)) => {}
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = job() => {}
        }
    }

    info!("Schedule '{}' stopped", name);
}
