mod actor;
pub mod client;
pub mod display;
mod handle;
pub mod models;
pub mod notifications;
pub mod repository;
pub mod scheduler;
pub mod setup;

pub use client::{AgendaApi, AgendaClient};
pub use handle::AgendaHandle;
pub use models::{DailySummary, Event};
pub use repository::AgendaRepository;
pub use scheduler::{schedule_daily_sync, DailySync, RetryPolicy, DAILY_SYNC_WORK};

use super::AppContext;
use crate::error::AgendaResult;
use crate::utils::scheduler::ScheduleRegistry;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Agenda component: the actor plus the daily background run
#[derive(Default)]
pub struct Agenda {
    handle: RwLock<Option<AgendaHandle>>,
    schedules: ScheduleRegistry,
}

impl Agenda {
    /// Create a new Agenda component
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the handle if it exists
    pub async fn get_handle(&self) -> Option<AgendaHandle> {
        let handle_lock = self.handle.read().await;
        handle_lock.clone()
    }

    pub fn schedules(&self) -> &ScheduleRegistry {
        &self.schedules
    }
}

/// Build a handle from the stored preferences
pub async fn connect(ctx: &AppContext) -> AgendaResult<AgendaHandle> {
    let config = ctx.config.read().await;
    let prefs = ctx.preferences.snapshot().await;

    let client = AgendaClient::new(&prefs.server_url, config.http_timeout())?;
    let repository = AgendaRepository::new(
        Arc::new(client),
        Arc::clone(&ctx.cache),
        Arc::clone(&ctx.preferences),
        config.tz()?,
    );
    Ok(AgendaHandle::new(repository))
}

#[async_trait]
impl super::Component for Agenda {
    fn name(&self) -> &'static str {
        "agenda"
    }

    async fn init(&self, ctx: &AppContext) -> AgendaResult<()> {
        let prefs = ctx.preferences.snapshot().await;
        if !prefs.is_configured() {
            warn!("Agenda is not configured yet, run `smart-agenda setup` first");
            return Ok(());
        }

        // Create a new handle if one doesn't exist
        let mut handle_lock = self.handle.write().await;
        let handle = match handle_lock.as_ref() {
            Some(handle) => handle.clone(),
            None => {
                let handle = connect(ctx).await?;
                *handle_lock = Some(handle.clone());
                handle
            }
        };
        drop(handle_lock);

        if !prefs.notifications_enabled {
            info!("Daily notifications are disabled");
            return Ok(());
        }

        let sync = {
            let config = ctx.config.read().await;
            DailySync::new(handle, Arc::clone(&ctx.notifier), &config)?
        };
        schedule_daily_sync(
            &self.schedules,
            sync,
            prefs.notification_hour,
            prefs.notification_minute,
        )
    }

    async fn shutdown(&self) -> AgendaResult<()> {
        self.schedules.cancel_all();

        // Shutdown the handle if it exists
        let handle_lock = self.handle.read().await;
        if let Some(handle) = &*handle_lock {
            handle.shutdown().await?;
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
