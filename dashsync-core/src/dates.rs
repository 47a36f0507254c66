//! Day/month helpers shared by the renderer, the collector and the admin
//! panel.

use chrono::{DateTime, Datelike, Local, NaiveDate, Utc};

use crate::constants::MONTH_NAMES;
use crate::normalize::split_day_month;

/// `"março"` style month to its 1-based number.
pub fn month_number(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    MONTH_NAMES
        .iter()
        .position(|m| *m == lower)
        .map(|i| i as u32 + 1)
}

/// `"05/03"` → `"05 de março"`. Empty when the date is not a valid `DD/MM`.
pub fn date_phrase(date: &str) -> String {
    let Some((day, month)) = split_day_month(date) else {
        return String::new();
    };
    match month.parse::<usize>() {
        Ok(m) if (1..=12).contains(&m) => format!("{} de {}", day, MONTH_NAMES[m - 1]),
        _ => String::new(),
    }
}

/// Whether a `DD/MM` date falls on `today` (year ignored).
pub fn is_today(date: &str, today: NaiveDate) -> bool {
    match split_day_month(date) {
        Some((day, month)) => {
            day == format!("{:02}", today.day()) && month == format!("{:02}", today.month())
        }
        None => false,
    }
}

/// Form input `YYYY-MM-DD` → `DD/MM`.
pub fn input_to_day_month(input: &str) -> Option<String> {
    let date = NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").ok()?;
    Some(format!("{:02}/{:02}", date.day(), date.month()))
}

/// `DD/MM/YYYY`, the date stamped on news created from the admin panel.
pub fn news_date(today: NaiveDate) -> String {
    today.format("%d/%m/%Y").to_string()
}

/// `DD/MM/YYYY às HH:MM` in local time, for the "last updated" label.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local)
        .format("%d/%m/%Y às %H:%M")
        .to_string()
}

/// Event timestamp as `DD/MM/YYYY HH:MM`; the raw value when unparseable.
pub fn format_event_time(raw: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.with_timezone(&Local).format("%d/%m/%Y %H:%M").to_string();
    }
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M") {
        return naive.format("%d/%m/%Y %H:%M").to_string();
    }
    raw.to_string()
}
