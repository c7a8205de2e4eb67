use crate::components::agenda::models::Event;
use crate::components::event_cache::{
    sort_for_day, sort_recent_first, sort_upcoming, stale_ids_for_date, EventCache,
};
use crate::error::{cache_error, AgendaResult};
use async_trait::async_trait;
use chrono::NaiveDate;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client as RedisClient};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

// Redis key constants
pub mod keys {
    /// Hash of event id -> JSON event
    pub const EVENTS: &str = "smart_agenda:events";
}

/// The Redis actor that owns the connection and serializes every write
pub struct RedisActor {
    client: RedisClient,
    connection: Option<ConnectionManager>,
    command_rx: mpsc::Receiver<RedisCommand>,
}

/// Commands that can be sent to the Redis actor
pub enum RedisCommand {
    EventsForDate(NaiveDate, oneshot::Sender<AgendaResult<Vec<Event>>>),
    RecentEvents(usize, oneshot::Sender<AgendaResult<Vec<Event>>>),
    EventsFrom(NaiveDate, usize, oneshot::Sender<AgendaResult<Vec<Event>>>),
    UpsertEvents(Vec<Event>, oneshot::Sender<AgendaResult<()>>),
    ReplaceDate(NaiveDate, Vec<Event>, oneshot::Sender<AgendaResult<()>>),
    DeleteEvent(String, oneshot::Sender<AgendaResult<bool>>),
    DeleteOlderThan(NaiveDate, oneshot::Sender<AgendaResult<usize>>),
    Clear(oneshot::Sender<AgendaResult<()>>),
    Shutdown,
}

/// Handle for communicating with the Redis actor
#[derive(Clone)]
pub struct RedisActorHandle {
    command_tx: mpsc::Sender<RedisCommand>,
}

impl RedisActorHandle {
    async fn call<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<AgendaResult<T>>) -> RedisCommand,
    ) -> AgendaResult<T> {
        let (response_tx, response_rx) = oneshot::channel();
        self.command_tx
            .send(command(response_tx))
            .await
            .map_err(|e| cache_error(&format!("Actor mailbox error: {}", e)))?;

        response_rx
            .await
            .map_err(|_| cache_error("Response channel closed"))?
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> AgendaResult<()> {
        let _ = self.command_tx.send(RedisCommand::Shutdown).await;
        Ok(())
    }
}

#[async_trait]
impl EventCache for RedisActorHandle {
    async fn events_for_date(&self, date: NaiveDate) -> AgendaResult<Vec<Event>> {
        self.call(|tx| RedisCommand::EventsForDate(date, tx)).await
    }

    async fn recent_events(&self, limit: usize) -> AgendaResult<Vec<Event>> {
        self.call(|tx| RedisCommand::RecentEvents(limit, tx)).await
    }

    async fn events_from(&self, from: NaiveDate, limit: usize) -> AgendaResult<Vec<Event>> {
        self.call(|tx| RedisCommand::EventsFrom(from, limit, tx))
            .await
    }

    async fn upsert_events(&self, events: Vec<Event>) -> AgendaResult<()> {
        self.call(|tx| RedisCommand::UpsertEvents(events, tx)).await
    }

    async fn replace_events_for_date(
        &self,
        date: NaiveDate,
        events: Vec<Event>,
    ) -> AgendaResult<()> {
        self.call(|tx| RedisCommand::ReplaceDate(date, events, tx))
            .await
    }

    async fn delete_event(&self, id: &str) -> AgendaResult<bool> {
        let id = id.to_string();
        self.call(|tx| RedisCommand::DeleteEvent(id, tx)).await
    }

    async fn delete_older_than(&self, cutoff: NaiveDate) -> AgendaResult<usize> {
        self.call(|tx| RedisCommand::DeleteOlderThan(cutoff, tx))
            .await
    }

    async fn clear(&self) -> AgendaResult<()> {
        self.call(RedisCommand::Clear).await
    }
}

impl RedisActor {
    /// Create a new actor and return its handle
    pub fn new(redis_url: &str) -> AgendaResult<(Self, RedisActorHandle)> {
        let (command_tx, command_rx) = mpsc::channel(32);

        let client = RedisClient::open(redis_url)
            .map_err(|e| cache_error(&format!("Failed to create Redis client: {}", e)))?;

        let actor = Self {
            client,
            connection: None,
            command_rx,
        };

        Ok((actor, RedisActorHandle { command_tx }))
    }

    /// Start the actor's processing loop
    pub async fn run(&mut self) {
        info!("Redis actor started");

        // Process commands
        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                RedisCommand::EventsForDate(date, response_tx) => {
                    let result = self.events_for_date(date).await;
                    let _ = response_tx.send(result);
                }
                RedisCommand::RecentEvents(limit, response_tx) => {
                    let result = self.recent_events(limit).await;
                    let _ = response_tx.send(result);
                }
                RedisCommand::EventsFrom(from, limit, response_tx) => {
                    let result = self.events_from(from, limit).await;
                    let _ = response_tx.send(result);
                }
                RedisCommand::UpsertEvents(events, response_tx) => {
                    let result = self.upsert_events(&events).await;
                    let _ = response_tx.send(result);
                }
                RedisCommand::ReplaceDate(date, events, response_tx) => {
                    let result = self.replace_date(date, &events).await;
                    let _ = response_tx.send(result);
                }
                RedisCommand::DeleteEvent(id, response_tx) => {
                    let result = self.delete_ids(&[id]).await.map(|n| n > 0);
                    let _ = response_tx.send(result);
                }
                RedisCommand::DeleteOlderThan(cutoff, response_tx) => {
                    let result = self.delete_older_than(cutoff).await;
                    let _ = response_tx.send(result);
                }
                RedisCommand::Clear(response_tx) => {
                    let result = self.clear().await;
                    let _ = response_tx.send(result);
                }
                RedisCommand::Shutdown => {
                    info!("Redis actor shutting down");
                    break;
                }
            }
        }

        info!("Redis actor shut down");
    }

    /// Get a redis connection, connecting on first use
    async fn connection(&mut self) -> AgendaResult<ConnectionManager> {
        if let Some(connection) = &self.connection {
            return Ok(connection.clone());
        }

        let connection = ConnectionManager::new(self.client.clone())
            .await
            .map_err(|e| cache_error(&format!("Failed to connect to Redis: {}", e)))?;
        self.connection = Some(connection.clone());
        Ok(connection)
    }

    async fn all_events(&mut self) -> AgendaResult<Vec<Event>> {
        let mut conn = self.connection().await?;
        let values: Vec<String> = conn.hvals(keys::EVENTS).await?;

        Ok(decode_events(&values))
    }

    async fn events_for_date(&mut self, date: NaiveDate) -> AgendaResult<Vec<Event>> {
        let mut events: Vec<Event> = self
            .all_events()
            .await?
            .into_iter()
            .filter(|e| e.date == date)
            .collect();
        sort_for_day(&mut events);
        Ok(events)
    }

    async fn recent_events(&mut self, limit: usize) -> AgendaResult<Vec<Event>> {
        let mut events = self.all_events().await?;
        sort_recent_first(&mut events);
        events.truncate(limit);
        Ok(events)
    }

    async fn events_from(&mut self, from: NaiveDate, limit: usize) -> AgendaResult<Vec<Event>> {
        let mut events: Vec<Event> = self
            .all_events()
            .await?
            .into_iter()
            .filter(|e| e.date >= from)
            .collect();
        sort_upcoming(&mut events);
        events.truncate(limit);
        Ok(events)
    }

    async fn upsert_events(&mut self, events: &[Event]) -> AgendaResult<()> {
        if events.is_empty() {
            return Ok(());
        }

        let mut fields = Vec::with_capacity(events.len());
        for event in events {
            fields.push((event.id.clone(), serde_json::to_string(event)?));
        }

        let mut conn = self.connection().await?;
        () = conn.hset_multiple(keys::EVENTS, &fields[..]).await?;
        debug!("Upserted {} events", fields.len());
        Ok(())
    }

    async fn replace_date(&mut self, date: NaiveDate, events: &[Event]) -> AgendaResult<()> {
        let cached = self.all_events().await?;
        let stale = stale_ids_for_date(&cached, date, events);
        self.delete_ids(&stale).await?;
        self.upsert_events(events).await
    }

    async fn delete_ids(&mut self, ids: &[String]) -> AgendaResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let mut conn = self.connection().await?;
        let removed: usize = conn.hdel(keys::EVENTS, ids).await?;
        Ok(removed)
    }

    async fn delete_older_than(&mut self, cutoff: NaiveDate) -> AgendaResult<usize> {
        let old: Vec<String> = self
            .all_events()
            .await?
            .into_iter()
            .filter(|e| e.date < cutoff)
            .map(|e| e.id)
            .collect();
        self.delete_ids(&old).await
    }

    async fn clear(&mut self) -> AgendaResult<()> {
        let mut conn = self.connection().await?;
        () = conn.del(keys::EVENTS).await?;
        Ok(())
    }
}

/// Decode cached rows, logging and skipping the unreadable ones
fn decode_events(values: &[String]) -> Vec<Event> {
    values
        .iter()
        .filter_map(|value| match serde_json::from_str::<Event>(value) {
            Ok(event) => Some(event),
            Err(e) => {
                warn!("Skipping unreadable cached event: {}", e);
                None
            }
        })
        .collect()
}
