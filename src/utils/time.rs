use chrono::{DateTime, Days, Duration, Locale, NaiveDate, NaiveTime, TimeZone, Utc};

/// Parse time string in HH:MM format
pub fn parse_time(time_str: &str) -> Option<(u32, u32)> {
    let parts: Vec<&str> = time_str.trim().split(':').collect();
    if parts.len() != 2 {
        return None;
    }
    let hour = parts[0].parse::<u32>().ok()?;
    let minute = parts[1].parse::<u32>().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }
    Some((hour, minute))
}

/// Next occurrence of `hour:minute` strictly after `now`, in `now`'s timezone
///
/// A time that falls into a DST gap fires at the first valid instant after it.
pub fn next_daily_time<Tz: TimeZone>(
    now: &DateTime<Tz>,
    hour: u32,
    minute: u32,
) -> Option<DateTime<Tz>> {
    let target = NaiveTime::from_hms_opt(hour, minute, 0)?;
    let tz = now.timezone();
    let mut date = now.date_naive();

    // Today, tomorrow, and one spare day for DST edge cases
    for _ in 0..3 {
        let naive = date.and_time(target);
        let candidate = tz
            .from_local_datetime(&naive)
            .earliest()
            .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest());

        if let Some(candidate) = candidate {
            if candidate > *now {
                return Some(candidate);
            }
        }
        date = date.succ_opt()?;
    }

    None
}

/// Calculate the wait duration until the next run, in seconds
pub fn calculate_wait_duration<Tz: TimeZone>(now: &DateTime<Tz>, next: &DateTime<Tz>) -> u64 {
    let seconds = next.clone().signed_duration_since(now.clone()).num_seconds();

    if seconds <= 0 {
        // Minimum wait so a run that is due right now does not spin
        return 1;
    }

    seconds as u64
}

/// Today's date in the given timezone
pub fn today_in<Tz: TimeZone>(tz: &Tz) -> NaiveDate {
    Utc::now().with_timezone(tz).date_naive()
}

/// First day kept when keeping `days` days of history before `today`
///
/// `None` for a negative window or one reaching past the calendar's start.
pub fn retention_cutoff(today: NaiveDate, days: i64) -> Option<NaiveDate> {
    let days = u64::try_from(days).ok()?;
    today.checked_sub_days(Days::new(days))
}

/// chrono locale for one of the supported catalog locales
pub fn chrono_locale(locale: &str) -> Locale {
    match locale {
        "fr" => Locale::fr_FR,
        _ => Locale::en_US,
    }
}

/// Long, localized date such as "Saturday 1 June 2024" or "Samedi 1 juin 2024"
pub fn format_long_date(date: NaiveDate, locale: &str, with_year: bool) -> String {
    let pattern = if with_year { "%A %-d %B %Y" } else { "%A %-d %B" };
    let noon = date.and_time(NaiveTime::MIN) + Duration::hours(12);
    let formatted = Utc
        .from_utc_datetime(&noon)
        .format_localized(pattern, chrono_locale(locale))
        .to_string();
    capitalize_first(&formatted)
}

/// Uppercase the first character
pub fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Europe::Paris;

    #[test]
    fn parses_valid_times_only() {
        assert_eq!(parse_time("07:00"), Some((7, 0)));
        assert_eq!(parse_time("23:59"), Some((23, 59)));
        assert_eq!(parse_time("24:00"), None);
        assert_eq!(parse_time("7"), None);
        assert_eq!(parse_time("aa:bb"), None);
    }

    #[test]
    fn next_daily_time_rolls_over_to_tomorrow() {
        let now = Paris.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
        let next = next_daily_time(&now, 7, 0).unwrap();
        assert_eq!(next, Paris.with_ymd_and_hms(2024, 6, 2, 7, 0, 0).unwrap());

        let next = next_daily_time(&now, 9, 30).unwrap();
        assert_eq!(next, Paris.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap());
    }

    #[test]
    fn exact_target_time_is_scheduled_for_tomorrow() {
        let now = Paris.with_ymd_and_hms(2024, 6, 1, 7, 0, 0).unwrap();
        let next = next_daily_time(&now, 7, 0).unwrap();
        assert_eq!(next.date_naive(), NaiveDate::from_ymd_opt(2024, 6, 2).unwrap());
    }

    #[test]
    fn dst_gap_fires_after_the_gap() {
        // 2024-03-31 02:30 does not exist in Paris
        let now = Paris.with_ymd_and_hms(2024, 3, 31, 0, 0, 0).unwrap();
        let next = next_daily_time(&now, 2, 30).unwrap();
        assert_eq!(next.date_naive(), NaiveDate::from_ymd_opt(2024, 3, 31).unwrap());
        assert!(next > now);
    }

    #[test]
    fn retention_cutoff_never_moves_forward() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(
            retention_cutoff(today, 30),
            NaiveDate::from_ymd_opt(2024, 5, 2)
        );
        assert_eq!(retention_cutoff(today, 0), Some(today));
        assert_eq!(retention_cutoff(today, -5), None);
        assert_eq!(retention_cutoff(today, i64::MAX), None);
    }

    #[test]
    fn wait_duration_is_never_zero() {
        let now = Paris.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
        assert_eq!(calculate_wait_duration(&now, &now), 1);
        let later = now + Duration::minutes(5);
        assert_eq!(calculate_wait_duration(&now, &later), 300);
    }

    #[test]
    fn long_dates_are_localized() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(format_long_date(date, "en", true), "Saturday 1 June 2024");
        assert_eq!(format_long_date(date, "fr", true), "Samedi 1 juin 2024");
        assert_eq!(format_long_date(date, "fr", false), "Samedi 1 juin");
    }
}
