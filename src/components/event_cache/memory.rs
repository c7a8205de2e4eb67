use super::{sort_for_day, sort_recent_first, sort_upcoming, stale_ids_for_date, EventCache};
use crate::components::agenda::models::Event;
use crate::error::AgendaResult;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-process event cache, lost on restart
#[derive(Debug, Default)]
pub struct MemoryEventCache {
    events: RwLock<HashMap<String, Event>>,
}

impl MemoryEventCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached events, all dates included
    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }
}

#[async_trait]
impl EventCache for MemoryEventCache {
    async fn events_for_date(&self, date: NaiveDate) -> AgendaResult<Vec<Event>> {
        let events = self.events.read().await;
        let mut day: Vec<Event> = events.values().filter(|e| e.date == date).cloned().collect();
        sort_for_day(&mut day);
        Ok(day)
    }

    async fn recent_events(&self, limit: usize) -> AgendaResult<Vec<Event>> {
        let events = self.events.read().await;
        let mut all: Vec<Event> = events.values().cloned().collect();
        sort_recent_first(&mut all);
        all.truncate(limit);
        Ok(all)
    }

    async fn events_from(&self, from: NaiveDate, limit: usize) -> AgendaResult<Vec<Event>> {
        let events = self.events.read().await;
        let mut upcoming: Vec<Event> = events.values().filter(|e| e.date >= from).cloned().collect();
        sort_upcoming(&mut upcoming);
        upcoming.truncate(limit);
        Ok(upcoming)
    }

    async fn upsert_events(&self, new_events: Vec<Event>) -> AgendaResult<()> {
        let mut events = self.events.write().await;
        for event in new_events {
            events.insert(event.id.clone(), event);
        }
        Ok(())
    }

    async fn replace_events_for_date(
        &self,
        date: NaiveDate,
        fresh: Vec<Event>,
    ) -> AgendaResult<()> {
        let mut events = self.events.write().await;
        for id in stale_ids_for_date(events.values(), date, &fresh) {
            events.remove(&id);
        }
        for event in fresh {
            events.insert(event.id.clone(), event);
        }
        Ok(())
    }

    async fn delete_event(&self, id: &str) -> AgendaResult<bool> {
        Ok(self.events.write().await.remove(id).is_some())
    }

    async fn delete_older_than(&self, cutoff: NaiveDate) -> AgendaResult<usize> {
        let mut events = self.events.write().await;
        let before = events.len();
        events.retain(|_, e| e.date >= cutoff);
        Ok(before - events.len())
    }

    async fn clear(&self) -> AgendaResult<()> {
        self.events.write().await.clear();
        Ok(())
    }
}
