mod common;

use common::*;
use smart_agenda::components::agenda::models::SummarySource;
use smart_agenda::components::event_cache::EventCache;
use smart_agenda::error::Error;

/// Two events, UV down, weather 14/21, no holiday
#[tokio::test]
async fn test_summary_with_partial_auxiliary_data() {
    let day = june_first();
    let fixture = Fixture::new(
        MockAgendaApi::new()
            .with_events(
                day,
                vec![
                    event("a", "Dentist", day, Some("09:30")),
                    event("b", "Market", day, None),
                ],
            )
            .with_weather(weather(14.0, 21.0))
            .uv_down(),
    );
    let mut repository = fixture.repository();

    let summary = repository.daily_summary(day).await.unwrap();

    assert_eq!(summary.total_events(), 2);
    assert!(summary.uv.is_none());
    let weather = summary.weather.as_ref().unwrap();
    assert_eq!(weather.temp_min, 14.0);
    assert_eq!(weather.temp_max, 21.0);
    assert!(!summary.is_holiday);
    assert_eq!(summary.holiday_name, None);
    assert_eq!(summary.source, SummarySource::Live);
    assert!(summary.last_updated.is_some());
    assert_eq!(
        fixture.preferences.last_sync().await.map(|t| t.timestamp_millis()),
        summary.last_updated.map(|t| t.timestamp_millis())
    );
}

#[tokio::test]
async fn test_every_auxiliary_failure_is_absorbed() {
    let day = june_first();
    let fixture = Fixture::new(
        MockAgendaApi::new()
            .with_events(day, vec![event("a", "Dentist", day, Some("09:30"))])
            .uv_down()
            .weather_down()
            .holiday_down(),
    );

    let summary = fixture.repository().daily_summary(day).await.unwrap();
    assert_eq!(summary.total_events(), 1);
    assert!(summary.weather.is_none());
    assert!(summary.uv.is_none());
    assert!(!summary.has_special_day());
}

#[tokio::test]
async fn test_holiday_name_is_kept() {
    let day = date(2024, 5, 20);
    let fixture = Fixture::new(MockAgendaApi::new().with_holiday("Lundi de Pentecôte"));

    let summary = fixture.repository().daily_summary(day).await.unwrap();
    assert!(summary.is_holiday);
    assert_eq!(summary.holiday_name.as_deref(), Some("Lundi de Pentecôte"));
    assert!(summary.has_content());
}

#[tokio::test]
async fn test_cache_holds_exactly_the_fetched_events() {
    let day = june_first();
    let fixture = Fixture::new(MockAgendaApi::new().with_events(
        day,
        vec![
            event("a", "Dentist", day, Some("09:30")),
            event("b", "Market", day, None),
        ],
    ));
    // Stale row from an earlier sync, deleted on the server since
    fixture
        .cache
        .upsert_event(event("gone", "Cancelled", day, Some("12:00")))
        .await
        .unwrap();
    let mut repository = fixture.repository();

    repository.daily_summary(day).await.unwrap();
    let first: Vec<String> = fixture
        .cache
        .events_for_date(day)
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.id)
        .collect();
    // All-day first, then by time
    assert_eq!(first, vec!["b".to_string(), "a".to_string()]);

    // Syncing again leaves the same set
    repository.daily_summary(day).await.unwrap();
    let second: Vec<String> = fixture
        .cache
        .events_for_date(day)
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(first, second);
    assert_eq!(fixture.cache.len().await, 2);
}

#[tokio::test]
async fn test_fallback_to_cached_events() {
    let day = june_first();
    let fixture = Fixture::new(
        MockAgendaApi::new()
            .with_events(day, vec![event("a", "Dentist", day, Some("09:30"))])
            .with_weather(weather(14.0, 21.0))
            .with_uv(uv(day, 4.0)),
    );
    let mut repository = fixture.repository();

    let live = repository.daily_summary(day).await.unwrap();
    fixture.api.set_events_down(true);
    let cached = repository.daily_summary(day).await.unwrap();

    assert_eq!(cached.events, live.events);
    assert_eq!(cached.source, SummarySource::Cache);
    assert!(cached.weather.is_none());
    assert!(cached.uv.is_none());
    assert!(!cached.is_holiday && !cached.is_vacation);
    assert_eq!(
        cached.last_updated.map(|t| t.timestamp_millis()),
        live.last_updated.map(|t| t.timestamp_millis())
    );
}

#[tokio::test]
async fn test_cache_miss_when_nothing_cached() {
    let fixture = Fixture::new(MockAgendaApi::new());
    fixture.api.set_events_down(true);

    let result = fixture.repository().daily_summary(june_first()).await;
    match result {
        Err(Error::CacheMiss(message)) => assert!(message.contains("connection refused")),
        other => panic!("expected a cache miss, got {:?}", other),
    }
}

#[tokio::test]
async fn test_rejected_login_falls_back_and_retries_login() {
    let day = june_first();
    let fixture = Fixture::new(MockAgendaApi::new().rejecting_login());
    fixture
        .cache
        .upsert_event(event("a", "Dentist", day, Some("09:30")))
        .await
        .unwrap();
    let mut repository = fixture.repository();

    let summary = repository.daily_summary(day).await.unwrap();
    assert!(summary.is_from_cache());
    assert_eq!(fixture.api.events_fetches(), 0);

    repository.daily_summary(day).await.unwrap();
    assert_eq!(fixture.api.logins(), 2);
}

#[tokio::test]
async fn test_login_happens_once_per_session() {
    let fixture = Fixture::new(MockAgendaApi::new());
    let mut repository = fixture.repository();

    repository.daily_summary(june_first()).await.unwrap();
    repository.daily_summary(date(2024, 6, 2)).await.unwrap();
    repository.upcoming_events().await.unwrap();

    assert_eq!(fixture.api.logins(), 1);
}

#[tokio::test]
async fn test_upcoming_events_fall_back_to_future_cached_events() {
    let today = fixture_today();
    let tomorrow = today.succ_opt().unwrap();
    let next_week = today + chrono::Duration::days(7);
    let yesterday = today.pred_opt().unwrap();

    let fixture = Fixture::new(MockAgendaApi::new().with_upcoming(vec![
        event("t", "Tomorrow", tomorrow, Some("08:00")),
        event("w", "Next week", next_week, None),
    ]));
    fixture
        .cache
        .upsert_event(event("old", "Yesterday", yesterday, None))
        .await
        .unwrap();
    let mut repository = fixture.repository();

    let live = repository.upcoming_events().await.unwrap();
    assert_eq!(live.len(), 2);

    fixture.api.set_events_down(true);
    let cached = repository.upcoming_events().await.unwrap();
    let ids: Vec<&str> = cached.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["t", "w"]);
}

#[tokio::test]
async fn test_upcoming_fallback_returns_the_soonest_events() {
    let today = fixture_today();
    let fixture = Fixture::new(MockAgendaApi::new());
    let events = (1..=150)
        .map(|n| {
            let day = today + chrono::Duration::days(n);
            event(&format!("e{}", n), "Later", day, None)
        })
        .collect();
    fixture.cache.upsert_events(events).await.unwrap();
    fixture.api.set_events_down(true);

    let cached = fixture.repository().upcoming_events().await.unwrap();
    assert_eq!(cached.len(), 100);
    assert_eq!(cached[0].id, "e1");
    assert_eq!(cached[99].id, "e100");
}

#[tokio::test]
async fn test_upcoming_cache_miss() {
    let fixture = Fixture::new(MockAgendaApi::new());
    fixture.api.set_events_down(true);

    let result = fixture.repository().upcoming_events().await;
    assert!(matches!(result, Err(Error::CacheMiss(_))));
}

#[tokio::test]
async fn test_event_changes_reach_server_and_cache() {
    let day = june_first();
    let fixture = Fixture::new(MockAgendaApi::new());
    let handle = fixture.handle();

    handle
        .create_event(event("n", "New", day, Some("18:00")))
        .await
        .unwrap();
    assert_eq!(fixture.cache.events_for_date(day).await.unwrap().len(), 1);
    assert_eq!(fixture.api.created.lock().unwrap().len(), 1);

    handle.delete_event("n").await.unwrap();
    assert!(fixture.cache.is_empty().await);
    assert_eq!(fixture.api.deleted.lock().unwrap().as_slice(), ["n".to_string()]);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_refused_session_logs_in_again() {
    let day = june_first();
    let fixture = Fixture::new(MockAgendaApi::new().expiring_session(2));
    let mut repository = fixture.repository();

    let refused = repository.create_event(event("n", "New", day, None)).await;
    assert!(matches!(refused, Err(Error::Authentication(_))));
    assert!(fixture.cache.is_empty().await);

    let refused = repository.pending_notifications().await;
    assert!(matches!(refused, Err(Error::Authentication(_))));

    repository
        .create_event(event("n", "New", day, None))
        .await
        .unwrap();
    assert_eq!(fixture.api.logins(), 3);
    assert_eq!(fixture.cache.len().await, 1);
}

#[tokio::test]
async fn test_clean_old_cache() {
    let fixture = Fixture::new(MockAgendaApi::new());
    for (id, day) in [("a", 1), ("b", 10), ("c", 20)] {
        fixture
            .cache
            .upsert_event(event(id, id, date(2024, 5, day), None))
            .await
            .unwrap();
    }

    let removed = fixture
        .repository()
        .clean_old_cache(date(2024, 5, 10))
        .await
        .unwrap();
    assert_eq!(removed, 1);
    assert_eq!(fixture.cache.len().await, 2);
}

fn fixture_today() -> chrono::NaiveDate {
    smart_agenda::utils::time::today_in(&chrono_tz::Tz::UTC)
}
