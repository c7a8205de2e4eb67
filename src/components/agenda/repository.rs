//! Aggregate fetch for one day, with cache fallback.
//!
//! Events decide the outcome: if they cannot be fetched the summary comes from
//! the cache with every auxiliary field left out. Weather, UV, holiday and
//! vacation lookups are independent and a failure only drops that field.

use super::client::AgendaApi;
use super::models::{DailySummary, Event, NotificationItem, SummarySource};
use crate::components::event_cache::{EventCache, RECENT_EVENTS_LIMIT};
use crate::error::{AgendaResult, Error};
use crate::preferences::PreferencesStore;
use crate::utils::time::today_in;
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use std::fmt::Display;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct AgendaRepository {
    api: Arc<dyn AgendaApi>,
    cache: Arc<dyn EventCache>,
    preferences: Arc<PreferencesStore>,
    tz: Tz,
    authenticated: bool,
}

impl AgendaRepository {
    pub fn new(
        api: Arc<dyn AgendaApi>,
        cache: Arc<dyn EventCache>,
        preferences: Arc<PreferencesStore>,
        tz: Tz,
    ) -> Self {
        Self {
            api,
            cache,
            preferences,
            tz,
            authenticated: false,
        }
    }

    /// Today in the configured timezone
    pub fn today(&self) -> NaiveDate {
        today_in(&self.tz)
    }

    /// Log in with the stored credential unless the session is already open
    pub async fn authenticate(&mut self) -> AgendaResult<()> {
        if self.authenticated {
            return Ok(());
        }

        let password = self.preferences.snapshot().await.password;
        if password.is_empty() {
            return Err(Error::Authentication("No credential configured".to_string()));
        }

        self.api.login(&password).await?;
        self.authenticated = true;
        debug!("Authenticated against the agenda server");
        Ok(())
    }

    /// Build the summary for `date`, falling back to cached events
    pub async fn daily_summary(&mut self, date: NaiveDate) -> AgendaResult<DailySummary> {
        info!("Loading summary for {}", date);

        let fetched = match self.authenticate().await {
            Ok(()) => self.api.events_for_day(date).await,
            Err(e) => Err(e),
        };

        match fetched {
            Ok(events) => Ok(self.live_summary(date, events).await),
            Err(e) => {
                self.forget_session_on_auth_error(&e);
                warn!("Events fetch for {} failed, using cache: {}", date, e);
                self.cached_summary(date, e).await
            }
        }
    }

    async fn live_summary(&self, date: NaiveDate, events: Vec<Event>) -> DailySummary {
        info!("Received {} events for {}", events.len(), date);

        let uv = async {
            if date == self.today() {
                self.api.uv_today().await
            } else {
                self.api.uv_for_date(date).await
            }
        };
        let (uv, weather, holiday, vacation) = futures::join!(
            uv,
            self.api.weather_for_date(date),
            self.api.holiday_for_date(date),
            self.api.vacation_for_date(date),
        );

        let uv = absorb("UV", uv).flatten();
        let weather = absorb("weather", weather).flatten();
        let holiday = absorb("holiday", holiday).unwrap_or_default();
        let vacation = absorb("vacation", vacation).unwrap_or_default();

        if let Err(e) = self
            .cache
            .replace_events_for_date(date, events.clone())
            .await
        {
            warn!("Failed to cache events for {}: {}", date, e);
        }

        let now = Utc::now();
        if let Err(e) = self.preferences.set_last_sync(now).await {
            warn!("Failed to record sync time: {}", e);
        }

        DailySummary {
            date,
            events,
            is_holiday: holiday.is_holiday,
            holiday_name: holiday.name.filter(|_| holiday.is_holiday),
            is_vacation: vacation.is_vacation,
            vacation_name: vacation.name.filter(|_| vacation.is_vacation),
            weather,
            uv,
            last_updated: Some(now),
            source: SummarySource::Live,
        }
    }

    async fn cached_summary(&self, date: NaiveDate, cause: Error) -> AgendaResult<DailySummary> {
        let cached = self.cache.events_for_date(date).await?;
        if cached.is_empty() {
            return Err(Error::CacheMiss(format!(
                "no cached events for {} ({})",
                date, cause
            )));
        }

        info!("Loaded {} events for {} from cache", cached.len(), date);
        let mut summary = DailySummary::new(date, cached, SummarySource::Cache);
        summary.last_updated = self.preferences.last_sync().await;
        Ok(summary)
    }

    /// Upcoming events, cached on success; cached events from today on failure
    pub async fn upcoming_events(&mut self) -> AgendaResult<Vec<Event>> {
        let fetched = match self.authenticate().await {
            Ok(()) => self.api.upcoming_events().await,
            Err(e) => Err(e),
        };

        match fetched {
            Ok(events) => {
                if let Err(e) = self.cache.upsert_events(events.clone()).await {
                    warn!("Failed to cache upcoming events: {}", e);
                }
                Ok(events)
            }
            Err(e) => {
                self.forget_session_on_auth_error(&e);
                warn!("Upcoming events fetch failed, using cache: {}", e);
                let cached = self
                    .cache
                    .events_from(self.today(), RECENT_EVENTS_LIMIT)
                    .await?;
                if cached.is_empty() {
                    return Err(Error::CacheMiss(format!("no cached upcoming events ({})", e)));
                }
                Ok(cached)
            }
        }
    }

    pub async fn create_event(&mut self, event: Event) -> AgendaResult<()> {
        self.authenticate().await?;
        let sent = self.api.create_event(&event).await;
        self.within_session(sent)?;
        self.cache.upsert_event(event).await
    }

    pub async fn update_event(&mut self, event: Event) -> AgendaResult<()> {
        self.authenticate().await?;
        let sent = self.api.update_event(&event).await;
        self.within_session(sent)?;
        self.cache.upsert_event(event).await
    }

    pub async fn delete_event(&mut self, id: &str) -> AgendaResult<()> {
        self.authenticate().await?;
        let sent = self.api.delete_event(id).await;
        self.within_session(sent)?;
        self.cache.delete_event(id).await?;
        Ok(())
    }

    pub async fn pending_notifications(&mut self) -> AgendaResult<Vec<NotificationItem>> {
        self.authenticate().await?;
        let pending = self.api.pending_notifications().await;
        self.within_session(pending)
    }

    /// Connectivity probe
    pub async fn health_check(&self) -> AgendaResult<()> {
        self.api.health_check().await
    }

    /// Drop cached events dated before `cutoff`
    pub async fn clean_old_cache(&self, cutoff: NaiveDate) -> AgendaResult<usize> {
        let removed = self.cache.delete_older_than(cutoff).await?;
        if removed > 0 {
            info!("Removed {} cached events older than {}", removed, cutoff);
        }
        Ok(removed)
    }

    fn forget_session_on_auth_error(&mut self, error: &Error) {
        if matches!(error, Error::Authentication(_)) {
            self.authenticated = false;
        }
    }

    /// Pass a remote result through, dropping the session if it was rejected
    fn within_session<T>(&mut self, result: AgendaResult<T>) -> AgendaResult<T> {
        if let Err(e) = &result {
            self.forget_session_on_auth_error(e);
        }
        result
    }
}

/// Turn an auxiliary failure into an absent value
fn absorb<T, E: Display>(what: &str, result: Result<T, E>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("{} fetch failed: {}", what, e);
            None
        }
    }
}
