use super::models::{DailySummary, Event, NotificationItem};
use super::repository::AgendaRepository;
use crate::error::{component_error, AgendaResult};
use chrono::NaiveDate;
use tokio::sync::{mpsc, oneshot};
use tracing::info;

/// The agenda actor: owns the repository so server calls never overlap
pub struct AgendaActor {
    repository: AgendaRepository,
    command_rx: mpsc::Receiver<AgendaCommand>,
}

/// Commands that can be sent to the agenda actor
pub enum AgendaCommand {
    DailySummary(NaiveDate, oneshot::Sender<AgendaResult<DailySummary>>),
    UpcomingEvents(oneshot::Sender<AgendaResult<Vec<Event>>>),
    HealthCheck(oneshot::Sender<AgendaResult<()>>),
    CleanOldCache(NaiveDate, oneshot::Sender<AgendaResult<usize>>),
    PendingNotifications(oneshot::Sender<AgendaResult<Vec<NotificationItem>>>),
    CreateEvent(Event, oneshot::Sender<AgendaResult<()>>),
    UpdateEvent(Event, oneshot::Sender<AgendaResult<()>>),
    DeleteEvent(String, oneshot::Sender<AgendaResult<()>>),
    Shutdown,
}

/// Handle for communicating with the agenda actor
#[derive(Clone)]
pub struct AgendaActorHandle {
    command_tx: mpsc::Sender<AgendaCommand>,
}

impl AgendaActorHandle {
    async fn call<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<AgendaResult<T>>) -> AgendaCommand,
    ) -> AgendaResult<T> {
        let (response_tx, response_rx) = oneshot::channel();
        self.command_tx
            .send(command(response_tx))
            .await
            .map_err(|e| component_error(&format!("Actor mailbox error: {}", e)))?;

        response_rx
            .await
            .map_err(|_| component_error("Response channel closed"))?
    }

    pub async fn daily_summary(&self, date: NaiveDate) -> AgendaResult<DailySummary> {
        self.call(|tx| AgendaCommand::DailySummary(date, tx)).await
    }

    pub async fn upcoming_events(&self) -> AgendaResult<Vec<Event>> {
        self.call(AgendaCommand::UpcomingEvents).await
    }

    pub async fn health_check(&self) -> AgendaResult<()> {
        self.call(AgendaCommand::HealthCheck).await
    }

    pub async fn clean_old_cache(&self, cutoff: NaiveDate) -> AgendaResult<usize> {
        self.call(|tx| AgendaCommand::CleanOldCache(cutoff, tx)).await
    }

    pub async fn pending_notifications(&self) -> AgendaResult<Vec<NotificationItem>> {
        self.call(AgendaCommand::PendingNotifications).await
    }

    pub async fn create_event(&self, event: Event) -> AgendaResult<()> {
        self.call(|tx| AgendaCommand::CreateEvent(event, tx)).await
    }

    pub async fn update_event(&self, event: Event) -> AgendaResult<()> {
        self.call(|tx| AgendaCommand::UpdateEvent(event, tx)).await
    }

    pub async fn delete_event(&self, id: String) -> AgendaResult<()> {
        self.call(|tx| AgendaCommand::DeleteEvent(id, tx)).await
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> AgendaResult<()> {
        let _ = self.command_tx.send(AgendaCommand::Shutdown).await;
        Ok(())
    }
}

impl AgendaActor {
    /// Create a new actor and return its handle
    pub fn new(repository: AgendaRepository) -> (Self, AgendaActorHandle) {
        let (command_tx, command_rx) = mpsc::channel(32);

        let actor = Self {
            repository,
            command_rx,
        };

        (actor, AgendaActorHandle { command_tx })
    }

    /// Start the actor's processing loop
    pub async fn run(&mut self) {
        info!("Agenda actor started");

        // Process commands
        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                AgendaCommand::DailySummary(date, response_tx) => {
                    let result = self.repository.daily_summary(date).await;
                    let _ = response_tx.send(result);
                }
                AgendaCommand::UpcomingEvents(response_tx) => {
                    let result = self.repository.upcoming_events().await;
                    let _ = response_tx.send(result);
                }
                AgendaCommand::HealthCheck(response_tx) => {
                    let result = self.repository.health_check().await;
                    let _ = response_tx.send(result);
                }
                AgendaCommand::CleanOldCache(cutoff, response_tx) => {
                    let result = self.repository.clean_old_cache(cutoff).await;
                    let _ = response_tx.send(result);
                }
                AgendaCommand::PendingNotifications(response_tx) => {
                    let result = self.repository.pending_notifications().await;
                    let _ = response_tx.send(result);
                }
                AgendaCommand::CreateEvent(event, response_tx) => {
                    let result = self.repository.create_event(event).await;
                    let _ = response_tx.send(result);
                }
                AgendaCommand::UpdateEvent(event, response_tx) => {
                    let result = self.repository.update_event(event).await;
                    let _ = response_tx.send(result);
                }
                AgendaCommand::DeleteEvent(id, response_tx) => {
                    let result = self.repository.delete_event(&id).await;
                    let _ = response_tx.send(result);
                }
                AgendaCommand::Shutdown => {
                    info!("Agenda actor shutting down");
                    break;
                }
            }
        }

        info!("Agenda actor shut down");
    }
}
