#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use smart_agenda::components::agenda::models::{
    Event, HolidayResponse, NotificationItem, UvData, UvLevelInfo, VacationResponse, WeatherData,
};
use smart_agenda::components::agenda::{AgendaApi, AgendaHandle, AgendaRepository};
use smart_agenda::components::event_cache::{EventCache, MemoryEventCache};
use smart_agenda::components::notifier::{Notification, Notifier};
use smart_agenda::error::{AgendaResult, Error};
use smart_agenda::preferences::{Preferences, PreferencesStore};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const PASSWORD: &str = "correct-horse";

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn june_first() -> NaiveDate {
    date(2024, 6, 1)
}

pub fn event(id: &str, title: &str, day: NaiveDate, time: Option<&str>) -> Event {
    let event = Event::new(id, title, day);
    match time {
        Some(time) => event.at(time),
        None => event,
    }
}

pub fn weather(min: f64, max: f64) -> WeatherData {
    WeatherData {
        temp_min: min,
        temp_max: max,
        weather_code: Some(2),
        weather_description: "Partly cloudy".to_string(),
        icon: "⛅".to_string(),
        date: None,
    }
}

pub fn uv(day: NaiveDate, index: f64) -> UvData {
    UvData {
        date: day,
        uv_index: index,
        level_info: UvLevelInfo {
            level: "Moderate".to_string(),
            color: "yellow".to_string(),
            protection: "Sunglasses".to_string(),
        },
    }
}

#[derive(Default)]
struct MockState {
    events: HashMap<NaiveDate, Vec<Event>>,
    upcoming: Vec<Event>,
    weather: Option<WeatherData>,
    uv: Option<UvData>,
    holiday: HolidayResponse,
    vacation: VacationResponse,
    notifications: Vec<NotificationItem>,
    events_down: bool,
    events_failures_left: usize,
    uv_down: bool,
    weather_down: bool,
    holiday_down: bool,
    unhealthy_checks_left: usize,
    reject_login: bool,
    expired_session_calls_left: usize,
}

/// Scriptable stand-in for the SmartAgenda server
#[derive(Default)]
pub struct MockAgendaApi {
    state: Mutex<MockState>,
    pub login_calls: AtomicUsize,
    pub events_calls: AtomicUsize,
    pub health_calls: AtomicUsize,
    pub created: Mutex<Vec<Event>>,
    pub deleted: Mutex<Vec<String>>,
}

impl MockAgendaApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn with(self, change: impl FnOnce(&mut MockState)) -> Self {
        change(&mut self.state.lock().unwrap());
        self
    }

    pub fn with_events(self, day: NaiveDate, events: Vec<Event>) -> Self {
        self.with(|s| {
            s.events.insert(day, events);
        })
    }

    pub fn with_upcoming(self, events: Vec<Event>) -> Self {
        self.with(|s| s.upcoming = events)
    }

    pub fn with_weather(self, weather: WeatherData) -> Self {
        self.with(|s| s.weather = Some(weather))
    }

    pub fn with_uv(self, uv: UvData) -> Self {
        self.with(|s| s.uv = Some(uv))
    }

    pub fn with_holiday(self, name: &str) -> Self {
        self.with(|s| {
            s.holiday = HolidayResponse {
                is_holiday: true,
                name: Some(name.to_string()),
            }
        })
    }

    pub fn with_notifications(self, items: Vec<NotificationItem>) -> Self {
        self.with(|s| s.notifications = items)
    }

    pub fn uv_down(self) -> Self {
        self.with(|s| s.uv_down = true)
    }

    pub fn weather_down(self) -> Self {
        self.with(|s| s.weather_down = true)
    }

    pub fn holiday_down(self) -> Self {
        self.with(|s| s.holiday_down = true)
    }

    pub fn rejecting_login(self) -> Self {
        self.with(|s| s.reject_login = true)
    }

    /// The next `n` event writes or notification reads are refused as unauthenticated
    pub fn expiring_session(self, n: usize) -> Self {
        self.with(|s| s.expired_session_calls_left = n)
    }

    /// The first `n` health checks fail
    pub fn unhealthy_for(self, n: usize) -> Self {
        self.with(|s| s.unhealthy_checks_left = n)
    }

    /// The next `n` events fetches fail
    pub fn failing_events(self, n: usize) -> Self {
        self.with(|s| s.events_failures_left = n)
    }

    /// Every events fetch fails until `set_events_down(false)`
    pub fn set_events_down(&self, down: bool) {
        self.state.lock().unwrap().events_down = down;
    }

    pub fn set_events(&self, day: NaiveDate, events: Vec<Event>) {
        self.state.lock().unwrap().events.insert(day, events);
    }

    pub fn logins(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
    }

    pub fn events_fetches(&self) -> usize {
        self.events_calls.load(Ordering::SeqCst)
    }
}

fn offline() -> Error {
    Error::Network("connection refused".to_string())
}

impl MockAgendaApi {
    fn check_session(&self) -> AgendaResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.expired_session_calls_left > 0 {
            state.expired_session_calls_left -= 1;
            return Err(Error::Authentication("HTTP 401 - session expired".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl AgendaApi for MockAgendaApi {
    async fn login(&self, password: &str) -> AgendaResult<()> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        if self.state.lock().unwrap().reject_login || password != PASSWORD {
            return Err(Error::Authentication("HTTP 401 - bad password".to_string()));
        }
        Ok(())
    }

    async fn health_check(&self) -> AgendaResult<()> {
        self.health_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        if state.unhealthy_checks_left > 0 {
            state.unhealthy_checks_left -= 1;
            return Err(offline());
        }
        Ok(())
    }

    async fn events_for_day(&self, date: NaiveDate) -> AgendaResult<Vec<Event>> {
        self.events_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        if state.events_down {
            return Err(offline());
        }
        if state.events_failures_left > 0 {
            state.events_failures_left -= 1;
            return Err(offline());
        }
        Ok(state.events.get(&date).cloned().unwrap_or_default())
    }

    async fn upcoming_events(&self) -> AgendaResult<Vec<Event>> {
        let state = self.state.lock().unwrap();
        if state.events_down {
            return Err(offline());
        }
        Ok(state.upcoming.clone())
    }

    async fn uv_today(&self) -> AgendaResult<Option<UvData>> {
        let state = self.state.lock().unwrap();
        if state.uv_down {
            return Err(Error::Api {
                status: 503,
                message: "UV service unavailable".to_string(),
            });
        }
        Ok(state.uv.clone())
    }

    async fn uv_for_date(&self, _date: NaiveDate) -> AgendaResult<Option<UvData>> {
        self.uv_today().await
    }

    async fn weather_for_date(&self, _date: NaiveDate) -> AgendaResult<Option<WeatherData>> {
        let state = self.state.lock().unwrap();
        if state.weather_down {
            return Err(offline());
        }
        Ok(state.weather.clone())
    }

    async fn holiday_for_date(&self, _date: NaiveDate) -> AgendaResult<HolidayResponse> {
        let state = self.state.lock().unwrap();
        if state.holiday_down {
            return Err(offline());
        }
        Ok(state.holiday.clone())
    }

    async fn vacation_for_date(&self, _date: NaiveDate) -> AgendaResult<VacationResponse> {
        Ok(self.state.lock().unwrap().vacation.clone())
    }

    async fn create_event(&self, event: &Event) -> AgendaResult<()> {
        self.check_session()?;
        self.created.lock().unwrap().push(event.clone());
        Ok(())
    }

    async fn update_event(&self, event: &Event) -> AgendaResult<()> {
        self.check_session()?;
        self.created.lock().unwrap().push(event.clone());
        Ok(())
    }

    async fn delete_event(&self, id: &str) -> AgendaResult<()> {
        self.check_session()?;
        self.deleted.lock().unwrap().push(id.to_string());
        Ok(())
    }

    async fn pending_notifications(&self) -> AgendaResult<Vec<NotificationItem>> {
        self.check_session()?;
        Ok(self.state.lock().unwrap().notifications.clone())
    }
}

/// Keeps every notification it receives
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: Notification) -> AgendaResult<()> {
        self.sent.lock().unwrap().push(notification);
        Ok(())
    }
}

/// Preferences of a configured client
pub fn configured_preferences() -> Arc<PreferencesStore> {
    Arc::new(PreferencesStore::with_preferences(Preferences {
        server_url: "http://192.168.1.10:8086".to_string(),
        password: PASSWORD.to_string(),
        notifications_enabled: true,
        configured: true,
        ..Preferences::default()
    }))
}

/// Everything a repository test needs, sharing one cache
pub struct Fixture {
    pub api: Arc<MockAgendaApi>,
    pub cache: Arc<MemoryEventCache>,
    pub preferences: Arc<PreferencesStore>,
}

impl Fixture {
    pub fn new(api: MockAgendaApi) -> Self {
        Self {
            api: Arc::new(api),
            cache: Arc::new(MemoryEventCache::new()),
            preferences: configured_preferences(),
        }
    }

    pub fn repository(&self) -> AgendaRepository {
        let cache: Arc<dyn EventCache> = self.cache.clone();
        AgendaRepository::new(
            self.api.clone(),
            cache,
            Arc::clone(&self.preferences),
            chrono_tz::Tz::UTC,
        )
    }

    pub fn handle(&self) -> AgendaHandle {
        AgendaHandle::new(self.repository())
    }
}
