//! Local key-value store for the user's settings.
//!
//! Holds what the setup flow saves (server URL, credential, notification time)
//! plus the last successful sync time. Every setter re-reads the file, applies
//! its change and writes it back, so a daemon and a one-shot command sharing the
//! file only ever touch the fields they set.

use crate::error::AgendaResult;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::debug;

/// Default hour of the daily notification
pub const DEFAULT_NOTIFICATION_HOUR: u32 = 7;

/// Persisted user preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub server_url: String,
    pub password: String,
    pub notification_hour: u32,
    pub notification_minute: u32,
    pub notifications_enabled: bool,
    pub configured: bool,
    /// Milliseconds since the epoch
    pub last_sync_timestamp: Option<i64>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            server_url: String::new(),
            password: String::new(),
            notification_hour: DEFAULT_NOTIFICATION_HOUR,
            notification_minute: 0,
            notifications_enabled: false,
            configured: false,
            last_sync_timestamp: None,
        }
    }
}

impl Preferences {
    /// Server URL and credential are present and were validated once
    pub fn is_configured(&self) -> bool {
        self.configured && !self.server_url.is_empty() && !self.password.is_empty()
    }

    /// Last successful sync as a timestamp
    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        self.last_sync_timestamp
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
    }
}

/// Preferences backed by a TOML file
#[derive(Debug)]
pub struct PreferencesStore {
    path: Option<PathBuf>,
    data: RwLock<Preferences>,
}

impl PreferencesStore {
    /// Open the store at `path`, starting from defaults when the file is missing
    pub fn open(path: &Path) -> AgendaResult<Self> {
        let data = read_file(path)?.unwrap_or_else(|| {
            debug!("No preferences at {}, using defaults", path.display());
            Preferences::default()
        });

        Ok(Self {
            path: Some(path.to_path_buf()),
            data: RwLock::new(data),
        })
    }

    /// A store that is never written to disk
    pub fn in_memory() -> Self {
        Self::with_preferences(Preferences::default())
    }

    /// In-memory store seeded with the given preferences
    pub fn with_preferences(preferences: Preferences) -> Self {
        Self {
            path: None,
            data: RwLock::new(preferences),
        }
    }

    /// Current values
    pub async fn snapshot(&self) -> Preferences {
        self.data.read().await.clone()
    }

    pub async fn is_configured(&self) -> bool {
        self.data.read().await.is_configured()
    }

    pub async fn last_sync(&self) -> Option<DateTime<Utc>> {
        self.data.read().await.last_sync()
    }

    pub async fn set_server_url(&self, url: &str) -> AgendaResult<()> {
        self.update(|p| p.server_url = url.to_string()).await
    }

    pub async fn set_password(&self, password: &str) -> AgendaResult<()> {
        self.update(|p| p.password = password.to_string()).await
    }

    pub async fn set_notification_time(&self, hour: u32, minute: u32) -> AgendaResult<()> {
        self.update(|p| {
            p.notification_hour = hour;
            p.notification_minute = minute;
        })
        .await
    }

    pub async fn set_notifications_enabled(&self, enabled: bool) -> AgendaResult<()> {
        self.update(|p| p.notifications_enabled = enabled).await
    }

    pub async fn set_configured(&self, configured: bool) -> AgendaResult<()> {
        self.update(|p| p.configured = configured).await
    }

    pub async fn set_last_sync(&self, at: DateTime<Utc>) -> AgendaResult<()> {
        self.update(|p| p.last_sync_timestamp = Some(at.timestamp_millis()))
            .await
    }

    /// Apply several changes and persist them once
    ///
    /// The change is applied to the file's current content, and memory is only
    /// updated once the write succeeded.
    pub async fn update<F>(&self, change: F) -> AgendaResult<()>
    where
        F: FnOnce(&mut Preferences),
    {
        let mut data = self.data.write().await;

        let mut next = match &self.path {
            Some(path) => read_file(path)?.unwrap_or_else(|| data.clone()),
            None => data.clone(),
        };
        change(&mut next);

        if let Some(path) = &self.path {
            write_file(path, &next)?;
        }
        *data = next;
        Ok(())
    }
}

fn read_file(path: &Path) -> AgendaResult<Option<Preferences>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    Ok(Some(toml::from_str(&content)?))
}

/// Write the preferences, readable by the owner only since they hold the credential
fn write_file(path: &Path, data: &Preferences) -> AgendaResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let toml_str = toml::to_string(data)?;

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
        options.mode(0o600);
        if path.exists() {
            fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
        }
    }

    let mut file = options.open(path)?;
    file.write_all(toml_str.as_bytes())?;
    Ok(())
}
