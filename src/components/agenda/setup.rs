use super::client::{AgendaApi, AgendaClient};
use crate::error::{validation_error, AgendaResult};
use crate::preferences::{Preferences, PreferencesStore, DEFAULT_NOTIFICATION_HOUR};
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

pub const MIN_PASSWORD_LEN: usize = 8;

/// Progress of the connection test or the configuration save
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupState {
    Idle,
    Testing,
    Authenticating,
    Success(String),
    Error(String),
}

impl SetupState {
    pub fn is_success(&self) -> bool {
        matches!(self, SetupState::Success(_))
    }
}

/// Values entered by the user during setup
#[derive(Debug, Clone)]
pub struct SetupForm {
    pub server_url: String,
    pub password: String,
    pub notification_hour: u32,
    pub notification_minute: u32,
}

impl SetupForm {
    pub fn new(server_url: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            password: password.into(),
            notification_hour: DEFAULT_NOTIFICATION_HOUR,
            notification_minute: 0,
        }
    }

    pub fn at(mut self, hour: u32, minute: u32) -> Self {
        self.notification_hour = hour;
        self.notification_minute = minute;
        self
    }
}

/// `http(s)://host[:port][/]`, nothing else
pub fn validate_server_url(server_url: &str) -> AgendaResult<Url> {
    let trimmed = server_url.trim();
    let url = Url::parse(trimmed)
        .map_err(|e| validation_error(&format!("Invalid server URL '{}': {}", trimmed, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(validation_error(&format!(
            "Unsupported scheme '{}', expected http or https",
            url.scheme()
        )));
    }
    match url.host_str() {
        Some(host) if !host.is_empty() => {}
        _ => return Err(validation_error("Server URL has no host")),
    }
    if !url.username().is_empty() || url.password().is_some() {
        return Err(validation_error("Server URL must not carry credentials"));
    }
    if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
        return Err(validation_error(
            "Server URL must not have a path, query or fragment",
        ));
    }

    Ok(url)
}

pub fn validate_password(password: &str) -> AgendaResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(validation_error(&format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// Probe the server behind `api`
pub async fn test_connection(api: &dyn AgendaApi, locale: &str) -> SetupState {
    match api.health_check().await {
        Ok(()) => {
            info!("Connection test succeeded");
            SetupState::Success(t!("setup.connection_ok", locale = locale).to_string())
        }
        Err(e) => {
            warn!("Connection test failed: {}", e);
            SetupState::Error(
                t!("setup.connection_failed", locale = locale, error = e.to_string()).to_string(),
            )
        }
    }
}

/// Validate `server_url`, then probe it with a fresh client
pub async fn check_server(server_url: &str, timeout: Duration, locale: &str) -> SetupState {
    if validate_server_url(server_url).is_err() {
        return SetupState::Error(t!("setup.invalid_url", locale = locale).to_string());
    }
    match AgendaClient::new(server_url, timeout) {
        Ok(client) => test_connection(&client, locale).await,
        Err(e) => SetupState::Error(
            t!("setup.connection_failed", locale = locale, error = e.to_string()).to_string(),
        ),
    }
}

/// Log in with the form's credential and persist everything on success
///
/// `api` must point at `form.server_url`. Nothing is written when validation
/// or the login fails.
pub async fn save_configuration(
    api: &dyn AgendaApi,
    preferences: &PreferencesStore,
    form: &SetupForm,
    locale: &str,
) -> SetupState {
    let server_url = form.server_url.trim();
    if validate_server_url(server_url).is_err() {
        return SetupState::Error(t!("setup.invalid_url", locale = locale).to_string());
    }
    if validate_password(&form.password).is_err() {
        return SetupState::Error(
            t!("setup.password_too_short", locale = locale, min = MIN_PASSWORD_LEN).to_string(),
        );
    }
    if form.notification_hour > 23 || form.notification_minute > 59 {
        return SetupState::Error(t!("setup.invalid_time", locale = locale).to_string());
    }

    if let Err(e) = api.login(&form.password).await {
        warn!("Authentication failed during setup: {}", e);
        return SetupState::Error(
            t!("setup.auth_failed", locale = locale, error = e.to_string()).to_string(),
        );
    }

    let saved = preferences
        .update(|prefs: &mut Preferences| {
            prefs.server_url = server_url.to_string();
            prefs.password = form.password.clone();
            prefs.notification_hour = form.notification_hour;
            prefs.notification_minute = form.notification_minute;
            prefs.notifications_enabled = true;
            prefs.configured = true;
        })
        .await;

    match saved {
        Ok(()) => {
            info!(
                "Configuration saved, daily run at {:02}:{:02}",
                form.notification_hour, form.notification_minute
            );
            SetupState::Success(t!("setup.saved", locale = locale).to_string())
        }
        Err(e) => SetupState::Error(
            t!("setup.save_failed", locale = locale, error = e.to_string()).to_string(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_host_and_port_only() {
        assert!(validate_server_url("http://192.168.1.10:8086").is_ok());
        assert!(validate_server_url("https://agenda.local/").is_ok());
        assert!(validate_server_url(" http://10.0.0.2:8086/ ").is_ok());
    }

    #[test]
    fn rejects_other_urls() {
        assert!(validate_server_url("ftp://10.0.0.2").is_err());
        assert!(validate_server_url("http://10.0.0.2:8086/api").is_err());
        assert!(validate_server_url("http://10.0.0.2/?x=1").is_err());
        assert!(validate_server_url("http://10.0.0.2/#top").is_err());
        assert!(validate_server_url("10.0.0.2:8086").is_err());
        assert!(validate_server_url("").is_err());
    }

    #[test]
    fn password_length() {
        assert!(validate_password("1234567").is_err());
        assert!(validate_password("12345678").is_ok());
    }
}
