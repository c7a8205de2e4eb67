//! Local store of fetched events, keyed by event id.
//!
//! Writes are upserts, so syncing the same day twice leaves the store
//! unchanged. Two implementations: [`MemoryEventCache`] and the Redis actor
//! in [`crate::components::redis_service`].

mod memory;

pub use memory::MemoryEventCache;

use crate::components::agenda::models::Event;
use crate::error::AgendaResult;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::cmp::Reverse;
use std::collections::HashSet;

/// Upper bound of the event lists read back for display
pub const RECENT_EVENTS_LIMIT: usize = 100;

#[async_trait]
pub trait EventCache: Send + Sync {
    /// Events on `date`, all-day events first, then by time
    async fn events_for_date(&self, date: NaiveDate) -> AgendaResult<Vec<Event>>;

    /// Most recent events first, at most `limit`
    async fn recent_events(&self, limit: usize) -> AgendaResult<Vec<Event>>;

    /// Events dated `from` or later, soonest first, at most `limit`
    async fn events_from(&self, from: NaiveDate, limit: usize) -> AgendaResult<Vec<Event>>;

    async fn upsert_event(&self, event: Event) -> AgendaResult<()> {
        self.upsert_events(vec![event]).await
    }

    async fn upsert_events(&self, events: Vec<Event>) -> AgendaResult<()>;

    /// Make the cached rows for `date` exactly `events`
    async fn replace_events_for_date(
        &self,
        date: NaiveDate,
        events: Vec<Event>,
    ) -> AgendaResult<()>;

    /// Returns whether an event was removed
    async fn delete_event(&self, id: &str) -> AgendaResult<bool>;

    /// Remove events dated strictly before `cutoff`, returning how many went
    async fn delete_older_than(&self, cutoff: NaiveDate) -> AgendaResult<usize>;

    async fn clear(&self) -> AgendaResult<()>;
}

/// Order events of a single day: all-day first, then by time, then by id
pub fn sort_for_day(events: &mut [Event]) {
    events.sort_by(|a, b| {
        a.time
            .cmp(&b.time)
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Order events soonest first: by date, then all-day before timed, then time
pub fn sort_upcoming(events: &mut [Event]) {
    events.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| a.time.cmp(&b.time))
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Order events most recent first
pub fn sort_recent_first(events: &mut [Event]) {
    events.sort_by_key(|e| (Reverse(e.date), Reverse(e.time.clone()), e.id.clone()));
}

/// Ids of cached events on `date` that are not part of `fresh`
pub fn stale_ids_for_date<'a>(
    cached: impl IntoIterator<Item = &'a Event>,
    date: NaiveDate,
    fresh: &[Event],
) -> Vec<String> {
    let keep: HashSet<&str> = fresh.iter().map(|e| e.id.as_str()).collect();
    cached
        .into_iter()
        .filter(|e| e.date == date && !keep.contains(e.id.as_str()))
        .map(|e| e.id.clone())
        .collect()
}
