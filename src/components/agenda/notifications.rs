use super::models::DailySummary;
use crate::components::notifier::{Notification, Priority};
use crate::utils::time::format_long_date;
use chrono::Utc;

/// Id shared by every notification of the daily run, so each replaces the last
pub const DAILY_NOTIFICATION_ID: u32 = 1001;

pub const NOTIFICATION_CHANNEL: &str = "smartagenda_channel";

/// Events listed in the notification body
pub const MAX_LISTED_EVENTS: usize = 3;

/// Days without events or special flags stay silent
pub fn should_notify(summary: &DailySummary) -> bool {
    summary.has_content()
}

/// Build the daily notification for `summary`
pub fn build_daily_notification(summary: &DailySummary, locale: &str) -> Notification {
    Notification {
        id: DAILY_NOTIFICATION_ID,
        channel: NOTIFICATION_CHANNEL.to_string(),
        title: daily_title(summary.total_events(), locale),
        body: daily_body(summary, locale),
        priority: Priority::High,
        created_at: Utc::now(),
    }
}

/// Raised when the daily run has given up
pub fn build_failure_notification(locale: &str) -> Notification {
    Notification {
        id: DAILY_NOTIFICATION_ID,
        channel: NOTIFICATION_CHANNEL.to_string(),
        title: t!("notification.failure_title", locale = locale).to_string(),
        body: t!("notification.failure_body", locale = locale).to_string(),
        priority: Priority::Default,
        created_at: Utc::now(),
    }
}

fn daily_title(count: usize, locale: &str) -> String {
    match count {
        0 => t!("notification.title_none", locale = locale),
        1 => t!("notification.title_one", locale = locale),
        _ => t!("notification.title_other", locale = locale, count = count),
    }
    .to_string()
}

fn daily_body(summary: &DailySummary, locale: &str) -> String {
    let mut lines = vec![format_long_date(summary.date, locale, false)];

    if let Some(name) = &summary.holiday_name {
        lines.push(format!("🎉 {}", name));
    }
    if let Some(name) = &summary.vacation_name {
        lines.push(format!("🎒 {}", name));
    }
    if let Some(weather) = &summary.weather {
        lines.push(format!(
            "{} {}°C / {}°C",
            weather.icon, weather.temp_min as i64, weather.temp_max as i64
        ));
    }
    if let Some(uv) = &summary.uv {
        lines.push(format!("☀️ UV: {} ({})", uv.uv_index, uv.level_info.level));
    }

    let count = summary.total_events();
    if count > 0 {
        lines.push(String::new());
        lines.push(t!("notification.upcoming", locale = locale).to_string());
        for event in summary.events.iter().take(MAX_LISTED_EVENTS) {
            let time = match &event.time {
                Some(time) => time.clone(),
                None => t!("common.all_day", locale = locale).to_string(),
            };
            lines.push(format!("• {} - {}", time, event.title));
        }

        let remaining = count.saturating_sub(MAX_LISTED_EVENTS);
        match remaining {
            0 => {}
            1 => lines.push(t!("notification.more_one", locale = locale).to_string()),
            n => lines.push(t!("notification.more_other", locale = locale, count = n).to_string()),
        }
    }

    lines.join("\n")
}
