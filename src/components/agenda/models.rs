use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Notification channel the server assigns when an event names none
pub const DEFAULT_NOTIFY_CHANNEL: &str = "android";

fn default_notify_channel() -> String {
    DEFAULT_NOTIFY_CHANNEL.to_string()
}

/// Agenda event as served by the SmartAgenda server
///
/// The server uses PascalCase keys; older versions sent camelCase or
/// snake_case, which are accepted as aliases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Event {
    #[serde(alias = "id")]
    pub id: String,
    #[serde(alias = "title")]
    pub title: String,
    #[serde(default, alias = "description")]
    pub description: Option<String>,
    #[serde(default, alias = "category")]
    pub category: String,
    #[serde(alias = "date")]
    pub date: NaiveDate,
    /// `HH:MM`, absent for all-day events
    #[serde(default, alias = "time")]
    pub time: Option<String>,
    #[serde(default, alias = "recurring")]
    pub recurring: bool,
    #[serde(default, alias = "recurringPattern", alias = "recurring_pattern")]
    pub recurring_pattern: Option<String>,
    #[serde(default, alias = "reminder")]
    pub reminder: Option<String>,
    #[serde(
        default = "default_notify_channel",
        alias = "notifyChannel",
        alias = "notify_channel"
    )]
    pub notify_channel: String,
    #[serde(default, alias = "startDate", alias = "start_date")]
    pub start_date: Option<NaiveDate>,
}

impl Event {
    /// Create an event with only the required fields set
    pub fn new(id: impl Into<String>, title: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            category: String::new(),
            date,
            time: None,
            recurring: false,
            recurring_pattern: None,
            reminder: None,
            notify_channel: default_notify_channel(),
            start_date: None,
        }
    }

    /// Set the time of day
    pub fn at(mut self, time: impl Into<String>) -> Self {
        self.time = Some(time.into());
        self
    }

    pub fn is_all_day(&self) -> bool {
        self.time.is_none()
    }
}

/// Weather forecast for one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherData {
    pub temp_min: f64,
    pub temp_max: f64,
    #[serde(default)]
    pub weather_code: Option<i32>,
    pub weather_description: String,
    pub icon: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

/// UV index reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UvData {
    pub date: NaiveDate,
    #[serde(alias = "uv_index")]
    pub uv_index: f64,
    #[serde(alias = "level_info")]
    pub level_info: UvLevelInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UvLevelInfo {
    pub level: String,
    pub color: String,
    pub protection: String,
}

/// Where a summary's events came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummarySource {
    Live,
    Cache,
}

/// Display-ready aggregate for one calendar day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub events: Vec<Event>,
    pub is_holiday: bool,
    pub holiday_name: Option<String>,
    pub is_vacation: bool,
    pub vacation_name: Option<String>,
    pub weather: Option<WeatherData>,
    pub uv: Option<UvData>,
    pub last_updated: Option<DateTime<Utc>>,
    pub source: SummarySource,
}

impl DailySummary {
    /// Summary with events only; every auxiliary field absent
    pub fn new(date: NaiveDate, events: Vec<Event>, source: SummarySource) -> Self {
        Self {
            date,
            events,
            is_holiday: false,
            holiday_name: None,
            is_vacation: false,
            vacation_name: None,
            weather: None,
            uv: None,
            last_updated: None,
            source,
        }
    }

    pub fn total_events(&self) -> usize {
        self.events.len()
    }

    /// Public holiday or school vacation
    pub fn has_special_day(&self) -> bool {
        self.is_holiday || self.is_vacation
    }

    /// Anything worth a notification
    pub fn has_content(&self) -> bool {
        !self.events.is_empty() || self.has_special_day()
    }

    pub fn is_from_cache(&self) -> bool {
        self.source == SummarySource::Cache
    }
}

// API request/response types

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventsResponse {
    #[serde(default)]
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UvResponse {
    pub success: bool,
    #[serde(default, alias = "uvData")]
    pub uv_data: Option<UvData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherResponse {
    pub success: bool,
    #[serde(default, alias = "tempMin")]
    pub temp_min: Option<f64>,
    #[serde(default, alias = "tempMax")]
    pub temp_max: Option<f64>,
    #[serde(default, alias = "weatherCode")]
    pub weather_code: Option<i32>,
    #[serde(default, alias = "weatherDescription")]
    pub weather_description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

impl WeatherResponse {
    /// Usable forecast, if the server had one
    pub fn into_weather(self, date: NaiveDate) -> Option<WeatherData> {
        if !self.success {
            return None;
        }
        let (temp_min, temp_max) = (self.temp_min?, self.temp_max?);
        Some(WeatherData {
            temp_min,
            temp_max,
            weather_code: self.weather_code,
            weather_description: self.weather_description.unwrap_or_default(),
            icon: self.icon.unwrap_or_default(),
            date: Some(date),
        })
    }
}

/// Public holiday lookup
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HolidayResponse {
    #[serde(rename = "ferie")]
    pub is_holiday: bool,
    #[serde(default, rename = "nom")]
    pub name: Option<String>,
}

/// School vacation lookup
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct VacationResponse {
    #[serde(rename = "conge")]
    pub is_vacation: bool,
    #[serde(default, rename = "nom")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationsResponse {
    pub success: bool,
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub notifications: Vec<NotificationItem>,
}

/// Notification queued on the server side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationItem {
    pub id: String,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub version: Option<String>,
}
