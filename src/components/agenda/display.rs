//! Plain-text rendering of summaries and event lists for the terminal.

use super::models::{DailySummary, Event, SummarySource, UvData, WeatherData};
use crate::utils::time::format_long_date;
use std::fmt::Write;

/// Colour marker for a UV index
pub fn uv_marker(uv_index: f64) -> &'static str {
    match uv_index {
        i if i <= 2.0 => "🟢",
        i if i <= 5.0 => "🟡",
        i if i <= 7.0 => "🟠",
        i if i <= 10.0 => "🔴",
        _ => "🟣",
    }
}

/// Render a full daily summary
pub fn render_summary(summary: &DailySummary, locale: &str) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "📅 {}", format_long_date(summary.date, locale, true));
    let source = match summary.source {
        SummarySource::Live => t!("display.source_live", locale = locale),
        SummarySource::Cache => t!("display.source_cache", locale = locale),
    };
    match summary.last_updated {
        Some(at) => {
            let at = at.format("%Y-%m-%d %H:%M UTC").to_string();
            let _ = writeln!(
                out,
                "{}",
                t!("display.updated", locale = locale, source = source, at = at)
            );
        }
        None => {
            let _ = writeln!(out, "{}", source);
        }
    }

    if let Some(name) = &summary.holiday_name {
        let _ = writeln!(out, "🎉 {}", name);
    } else if summary.is_holiday {
        let _ = writeln!(out, "🎉 {}", t!("display.holiday", locale = locale));
    }
    if let Some(name) = &summary.vacation_name {
        let _ = writeln!(out, "🎒 {}", name);
    } else if summary.is_vacation {
        let _ = writeln!(out, "🎒 {}", t!("display.vacation", locale = locale));
    }
    if let Some(weather) = &summary.weather {
        let _ = writeln!(out, "{}", weather_line(weather, locale));
    }
    if let Some(uv) = &summary.uv {
        let _ = writeln!(out, "{}", uv_line(uv, locale));
    }

    out.push('\n');
    if summary.events.is_empty() {
        let _ = writeln!(out, "{}", t!("display.no_events", locale = locale));
    } else {
        let _ = writeln!(
            out,
            "{}",
            t!("display.events_today", locale = locale, count = summary.total_events())
        );
        for event in &summary.events {
            let _ = writeln!(out, "{}", event_line(event, locale));
        }
    }

    out
}

/// Render events across several days, grouped under a date heading
pub fn render_events(events: &[Event], locale: &str) -> String {
    if events.is_empty() {
        return format!("{}\n", t!("display.no_upcoming", locale = locale));
    }

    let mut out = String::new();
    let mut current = None;
    for event in events {
        if current != Some(event.date) {
            if current.is_some() {
                out.push('\n');
            }
            let _ = writeln!(out, "{}:", format_long_date(event.date, locale, true));
            current = Some(event.date);
        }
        let _ = writeln!(out, "{}", event_line(event, locale));
    }
    out
}

fn weather_line(weather: &WeatherData, locale: &str) -> String {
    format!(
        "🌡️ {}: {} {} {}° / {}°",
        t!("display.weather", locale = locale),
        weather.icon,
        weather.weather_description,
        weather.temp_min as i64,
        weather.temp_max as i64
    )
}

fn uv_line(uv: &UvData, locale: &str) -> String {
    let mut line = format!(
        "☀️ {}: {:.1} {} ({})",
        t!("display.uv", locale = locale),
        uv.uv_index,
        uv_marker(uv.uv_index),
        uv.level_info.level
    );
    if !uv.level_info.protection.is_empty() {
        let _ = write!(line, " - {}", uv.level_info.protection);
    }
    line
}

fn event_line(event: &Event, locale: &str) -> String {
    let time = match &event.time {
        Some(time) => time.clone(),
        None => t!("common.all_day", locale = locale).to_string(),
    };
    let mut line = format!("• {} - {}", time, event.title);
    if !event.category.is_empty() {
        let _ = write!(line, " [{}]", event.category);
    }
    if event.recurring {
        line.push_str(" 🔄");
    }
    if event.reminder.as_deref().is_some_and(|r| r != "none") {
        line.push_str(" 🔔");
    }
    line
}
