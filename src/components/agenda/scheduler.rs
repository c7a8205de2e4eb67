use super::handle::AgendaHandle;
use super::models::DailySummary;
use super::notifications::{build_daily_notification, build_failure_notification, should_notify};
use crate::components::notifier::Notifier;
use crate::config::Config;
use crate::error::{AgendaResult, Error};
use crate::utils::scheduler::ScheduleRegistry;
use crate::utils::time::{retention_cutoff, today_in};
use chrono::NaiveDate;
use chrono_tz::Tz;
use std::sync::Arc;
use tokio::time::{sleep, Duration as TokioDuration};
use tracing::{error, info, warn};

/// Unique name of the daily background run
pub const DAILY_SYNC_WORK: &str = "daily_sync_work";

/// Where a background run stands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running { attempt: u32 },
    RetryScheduled { attempt: u32, delay: TokioDuration },
    Success,
    FinalFailure,
}

/// Bounded retry with exponential backoff
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_backoff: TokioDuration,
    pub notify_on_failure: bool,
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_backoff: TokioDuration::from_secs(config.retry_backoff_secs),
            notify_on_failure: config.notify_on_failure,
        }
    }

    /// Delay after the failed attempt number `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> TokioDuration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_backoff.saturating_mul(1 << exponent)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Outcome of one background run
#[derive(Debug)]
pub struct RunReport {
    pub state: RunState,
    pub attempts: u32,
    pub notified: bool,
    pub summary: Option<DailySummary>,
    pub pruned: usize,
}

/// Fetch the summary for `date`, notify, then prune the cache
///
/// Raises at most one notification and makes at most
/// `policy.max_attempts` attempts.
pub async fn run_daily_sync(
    handle: &AgendaHandle,
    notifier: &dyn Notifier,
    policy: &RetryPolicy,
    date: NaiveDate,
    locale: &str,
    retention_days: i64,
) -> RunReport {
    let mut state = RunState::Idle;
    let mut attempt = 0;

    let outcome = loop {
        attempt += 1;
        transition(&mut state, RunState::Running { attempt });

        match handle.daily_summary(date).await {
            Ok(summary) => break Ok(summary),
            Err(e) if attempt >= policy.max_attempts => break Err(e),
            Err(e) => {
                let delay = policy.backoff(attempt);
                warn!(
                    transient = e.is_transient(),
                    "Daily sync attempt {} failed: {}", attempt, e
                );
                transition(&mut state, RunState::RetryScheduled { attempt, delay });
                sleep(delay).await;
            }
        }
    };

    match outcome {
        Ok(summary) => {
            transition(&mut state, RunState::Success);

            let mut notified = false;
            if should_notify(&summary) {
                let notification = build_daily_notification(&summary, locale);
                match notifier.notify(notification).await {
                    Ok(()) => notified = true,
                    Err(e) => error!("Failed to send daily notification: {}", e),
                }
            } else {
                info!("Nothing to announce for {}", date);
            }

            let pruned = prune_cache(handle, date, retention_days).await;

            RunReport {
                state,
                attempts: attempt,
                notified,
                summary: Some(summary),
                pruned,
            }
        }
        Err(e) => {
            error!("Daily sync gave up after {} attempts: {}", attempt, e);
            transition(&mut state, RunState::FinalFailure);

            let mut notified = false;
            if policy.notify_on_failure {
                match notifier.notify(build_failure_notification(locale)).await {
                    Ok(()) => notified = true,
                    Err(e) => error!("Failed to send failure notification: {}", e),
                }
            }

            RunReport {
                state,
                attempts: attempt,
                notified,
                summary: None,
                pruned: 0,
            }
        }
    }
}

fn transition(state: &mut RunState, next: RunState) {
    info!("Daily sync: {:?} -> {:?}", state, next);
    *state = next;
}

async fn prune_cache(handle: &AgendaHandle, today: NaiveDate, retention_days: i64) -> usize {
    let Some(cutoff) = retention_cutoff(today, retention_days) else {
        warn!("Invalid cache retention of {} days, not pruning", retention_days);
        return 0;
    };
    match handle.clean_old_cache(cutoff).await {
        Ok(removed) => removed,
        Err(e) => {
            warn!("Failed to prune cache: {}", e);
            0
        }
    }
}

/// Block until the server answers a health check
pub async fn wait_for_connectivity(handle: &AgendaHandle, poll_interval: TokioDuration) {
    let mut announced = false;
    while let Err(e) = handle.health_check().await {
        if !announced {
            warn!("Server unreachable, waiting for connectivity: {}", e);
            announced = true;
        }
        sleep(poll_interval).await;
    }
    if announced {
        info!("Server reachable again");
    }
}

/// Everything the scheduled job needs, cloned into each run
#[derive(Clone)]
pub struct DailySync {
    pub handle: AgendaHandle,
    pub notifier: Arc<dyn Notifier>,
    pub policy: RetryPolicy,
    pub locale: String,
    pub retention_days: i64,
    pub poll_interval: TokioDuration,
    pub tz: Tz,
}

impl DailySync {
    pub fn new(
        handle: AgendaHandle,
        notifier: Arc<dyn Notifier>,
        config: &Config,
    ) -> AgendaResult<Self> {
        Ok(Self {
            handle,
            notifier,
            policy: RetryPolicy::from_config(config),
            locale: config.locale.clone(),
            retention_days: config.cache_retention_days,
            poll_interval: TokioDuration::from_secs(config.connectivity_poll_secs.max(1)),
            tz: config.tz()?,
        })
    }

    /// Run for today, without waiting for connectivity
    pub async fn run_now(&self) -> RunReport {
        run_daily_sync(
            &self.handle,
            self.notifier.as_ref(),
            &self.policy,
            today_in(&self.tz),
            &self.locale,
            self.retention_days,
        )
        .await
    }

    /// Wait for the server, then run for today
    pub async fn run_when_connected(&self) -> RunReport {
        wait_for_connectivity(&self.handle, self.poll_interval).await;
        self.run_now().await
    }
}

/// (Re)schedule the daily run at `hour:minute`, replacing any pending one
pub fn schedule_daily_sync(
    registry: &ScheduleRegistry,
    sync: DailySync,
    hour: u32,
    minute: u32,
) -> AgendaResult<()> {
    if hour > 23 || minute > 59 {
        return Err(Error::Validation(format!(
            "Invalid notification time {:02}:{:02}",
            hour, minute
        )));
    }

    let tz = sync.tz;
    registry.schedule(DAILY_SYNC_WORK, hour, minute, tz, move || {
        let sync = sync.clone();
        async move {
            let report = sync.run_when_connected().await;
            info!(
                "Daily sync finished: {:?} after {} attempt(s)",
                report.state, report.attempts
            );
        }
    });

    info!("Daily sync scheduled at {:02}:{:02} ({})", hour, minute, tz);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_backoff: TokioDuration::from_secs(30),
            notify_on_failure: false,
        };
        assert_eq!(policy.backoff(1), TokioDuration::from_secs(30));
        assert_eq!(policy.backoff(2), TokioDuration::from_secs(60));
        assert_eq!(policy.backoff(3), TokioDuration::from_secs(120));
    }
}
