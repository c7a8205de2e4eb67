//! Notification surface: where daily summaries end up.
//!
//! The platform notification manager is replaced by sinks implementing
//! [`Notifier`]. [`NotificationCenter`] keeps one active notification per id,
//! so a new daily summary replaces yesterday's.

use crate::error::{AgendaResult, Error};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{error, info};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Default,
    High,
}

/// A notification raised by the client
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: u32,
    pub channel: String,
    pub title: String,
    pub body: String,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: Notification) -> AgendaResult<()>;
}

/// Writes notifications to the log
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: Notification) -> AgendaResult<()> {
        info!(
            id = notification.id,
            channel = %notification.channel,
            "{}\n{}",
            notification.title,
            notification.body
        );
        Ok(())
    }
}

/// Posts notifications as JSON to a webhook
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: Client,
    url: Url,
}

impl WebhookNotifier {
    pub fn new(url: &str, timeout: Duration) -> AgendaResult<Self> {
        let url = Url::parse(url)
            .map_err(|e| Error::Config(format!("Invalid webhook URL '{}': {}", url, e)))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Network(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, notification: Notification) -> AgendaResult<()> {
        self.client
            .post(self.url.clone())
            .json(&notification)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Fan-out to every sink, keeping the latest notification per id
#[derive(Default)]
pub struct NotificationCenter {
    sinks: Vec<Arc<dyn Notifier>>,
    active: RwLock<HashMap<u32, Notification>>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sink
    pub fn with_sink(mut self, sink: Arc<dyn Notifier>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// The notification currently shown under `id`
    pub async fn active(&self, id: u32) -> Option<Notification> {
        self.active.read().await.get(&id).cloned()
    }

    pub async fn active_count(&self) -> usize {
        self.active.read().await.len()
    }

    /// Dismiss the notification shown under `id`
    pub async fn cancel(&self, id: u32) -> bool {
        self.active.write().await.remove(&id).is_some()
    }
}

#[async_trait]
impl Notifier for NotificationCenter {
    async fn notify(&self, notification: Notification) -> AgendaResult<()> {
        let replaced = self
            .active
            .write()
            .await
            .insert(notification.id, notification.clone())
            .is_some();
        if replaced {
            info!("Replacing notification {}", notification.id);
        }

        for sink in &self.sinks {
            if let Err(e) = sink.notify(notification.clone()).await {
                // Log error but continue with other sinks
                error!("Failed to deliver notification {}: {}", notification.id, e);
            }
        }

        Ok(())
    }
}
