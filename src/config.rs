use crate::error::{config_error, env_error, AgendaResult};
use chrono_tz::Tz;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default location of the persisted preferences
pub const DEFAULT_PREFERENCES_PATH: &str = "config/preferences.toml";

/// Component switches file
pub const COMPONENTS_PATH: &str = "config/components.toml";

/// Longest cache retention accepted, in days
pub const MAX_CACHE_RETENTION_DAYS: i64 = 3650;

/// Locales with a message catalog
pub const SUPPORTED_LOCALES: [&str; 2] = ["en", "fr"];

/// Process-level configuration, read from the environment at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Where the user preferences (server URL, credential...) are stored
    pub preferences_path: PathBuf,
    /// Redis URL for the event cache; in-memory cache when unset
    pub redis_url: Option<String>,
    /// Timezone used to decide what "today" is and when the daily run fires
    pub timezone: String,
    /// Locale for notifications and rendering
    pub locale: String,
    /// Optional webhook receiving every raised notification
    pub webhook_url: Option<String>,
    /// Connect and request ceiling for the HTTP client
    pub http_timeout_secs: u64,
    /// Attempts of the daily run before giving up for the day
    pub max_attempts: u32,
    /// Initial retry backoff, doubled after each failed attempt
    pub retry_backoff_secs: u64,
    /// Interval between connectivity probes while waiting for the network
    pub connectivity_poll_secs: u64,
    /// Cached events older than this many days are pruned after each run
    pub cache_retention_days: i64,
    /// Raise a notification when the daily run finally fails
    pub notify_on_failure: bool,
    /// Map of component names to their enabled status
    pub components: HashMap<String, bool>,
}

impl Default for Config {
    fn default() -> Self {
        let mut components = HashMap::new();
        components.insert("agenda".to_string(), true);

        Self {
            preferences_path: PathBuf::from(DEFAULT_PREFERENCES_PATH),
            redis_url: None,
            timezone: "UTC".to_string(),
            locale: "en".to_string(),
            webhook_url: None,
            http_timeout_secs: 30,
            max_attempts: 3,
            retry_backoff_secs: 30,
            connectivity_poll_secs: 60,
            cache_retention_days: 30,
            notify_on_failure: false,
            components,
        }
    }
}

impl Config {
    /// Load configuration from environment and config file
    pub fn load() -> AgendaResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let defaults = Config::default();

        let preferences_path = env::var("SMART_AGENDA_PREFERENCES")
            .map(PathBuf::from)
            .unwrap_or(defaults.preferences_path);
        let redis_url = env::var("REDIS_URL").ok().filter(|url| !url.is_empty());
        let webhook_url = env::var("NOTIFICATION_WEBHOOK_URL")
            .ok()
            .filter(|url| !url.is_empty());
        let timezone = env::var("TIMEZONE").unwrap_or(defaults.timezone);
        let locale = env::var("LOCALE").unwrap_or(defaults.locale);

        let mut components = defaults.components;

        // Load components configuration from file if it exists
        if let Ok(content) = fs::read_to_string(COMPONENTS_PATH) {
            if let Ok(file_components) = toml::from_str::<HashMap<String, bool>>(&content) {
                // Merge with defaults
                for (key, value) in file_components {
                    components.insert(key, value);
                }
            }
        }

        let config = Config {
            preferences_path,
            redis_url,
            timezone,
            locale,
            webhook_url,
            http_timeout_secs: parse_env("HTTP_TIMEOUT_SECS", defaults.http_timeout_secs)?,
            max_attempts: parse_env("SYNC_MAX_ATTEMPTS", defaults.max_attempts)?,
            retry_backoff_secs: parse_env("SYNC_RETRY_BACKOFF_SECS", defaults.retry_backoff_secs)?,
            connectivity_poll_secs: parse_env(
                "CONNECTIVITY_POLL_SECS",
                defaults.connectivity_poll_secs,
            )?,
            cache_retention_days: parse_env("CACHE_RETENTION_DAYS", defaults.cache_retention_days)?,
            notify_on_failure: parse_env("NOTIFY_ON_FAILURE", defaults.notify_on_failure)?,
            components,
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the daemon misbehave
    pub fn validate(&self) -> AgendaResult<()> {
        self.tz()?;
        if !SUPPORTED_LOCALES.contains(&self.locale.as_str()) {
            return Err(config_error(&format!(
                "Unsupported locale '{}', expected one of {:?}",
                self.locale, SUPPORTED_LOCALES
            )));
        }
        if self.max_attempts == 0 {
            return Err(config_error("SYNC_MAX_ATTEMPTS must be at least 1"));
        }
        if self.http_timeout_secs == 0 {
            return Err(config_error("HTTP_TIMEOUT_SECS must be at least 1"));
        }
        if !(0..=MAX_CACHE_RETENTION_DAYS).contains(&self.cache_retention_days) {
            return Err(config_error(&format!(
                "CACHE_RETENTION_DAYS must be between 0 and {}",
                MAX_CACHE_RETENTION_DAYS
            )));
        }
        Ok(())
    }

    /// Parsed timezone
    pub fn tz(&self) -> AgendaResult<Tz> {
        Tz::from_str(&self.timezone)
            .map_err(|e| config_error(&format!("Invalid timezone '{}': {}", self.timezone, e)))
    }

    /// HTTP connect/request ceiling
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Check if a component is enabled
    pub fn is_component_enabled(&self, name: &str) -> bool {
        *self.components.get(name).unwrap_or(&false)
    }
}

fn parse_env<T: FromStr>(var: &str, default: T) -> AgendaResult<T> {
    match env::var(var) {
        Ok(value) => value.trim().parse::<T>().map_err(|_| env_error(var)),
        Err(_) => Ok(default),
    }
}
