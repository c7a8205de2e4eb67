use super::actor::{AgendaActor, AgendaActorHandle};
use super::models::{DailySummary, Event, NotificationItem};
use super::repository::AgendaRepository;
use crate::error::AgendaResult;
use chrono::NaiveDate;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Handle for interacting with the agenda actor
#[derive(Clone)]
pub struct AgendaHandle {
    actor_handle: AgendaActorHandle,
    _actor_task: Arc<JoinHandle<()>>,
}

impl AgendaHandle {
    /// Create a new AgendaHandle and spawn the actor
    pub fn new(repository: AgendaRepository) -> Self {
        // Create the actor and get its handle
        let (mut actor, handle) = AgendaActor::new(repository);

        // Spawn a task to run the actor
        let actor_task = tokio::spawn(async move {
            actor.run().await;
        });

        Self {
            actor_handle: handle,
            _actor_task: Arc::new(actor_task),
        }
    }

    /// Aggregate summary for one day
    pub async fn daily_summary(&self, date: NaiveDate) -> AgendaResult<DailySummary> {
        self.actor_handle.daily_summary(date).await
    }

    pub async fn upcoming_events(&self) -> AgendaResult<Vec<Event>> {
        self.actor_handle.upcoming_events().await
    }

    pub async fn health_check(&self) -> AgendaResult<()> {
        self.actor_handle.health_check().await
    }

    pub async fn clean_old_cache(&self, cutoff: NaiveDate) -> AgendaResult<usize> {
        self.actor_handle.clean_old_cache(cutoff).await
    }

    pub async fn pending_notifications(&self) -> AgendaResult<Vec<NotificationItem>> {
        self.actor_handle.pending_notifications().await
    }

    pub async fn create_event(&self, event: Event) -> AgendaResult<()> {
        self.actor_handle.create_event(event).await
    }

    pub async fn update_event(&self, event: Event) -> AgendaResult<()> {
        self.actor_handle.update_event(event).await
    }

    pub async fn delete_event(&self, id: &str) -> AgendaResult<()> {
        self.actor_handle.delete_event(id.to_string()).await
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> AgendaResult<()> {
        self.actor_handle.shutdown().await
    }
}
