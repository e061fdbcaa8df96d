//! Display labels for slot dates and times as the patient app renders them
//! ("Wed, Dec 14, 2024" and "10:30 AM").

use chrono::{NaiveDate, NaiveTime, Weekday};

pub fn time_label(time: NaiveTime) -> String {
    time.format("%-I:%M %p").to_string()
}

pub fn date_label(date: NaiveDate) -> String {
    date.format("%a, %b %-d, %Y").to_string()
}

/// Accepts `10:30 AM`, `10:30` or `10:30:00`.
pub fn parse_time_label(label: &str) -> Option<NaiveTime> {
    let label = label.trim();
    ["%I:%M %p", "%H:%M", "%H:%M:%S"]
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(label, format).ok())
}

/// Accepts ISO dates and app labels. A leading weekday is decorative and is
/// ignored; labels without a year (`Mon, Dec 16`) take `default_year`.
pub fn parse_date_label(label: &str, default_year: i32) -> Option<NaiveDate> {
    let label = label.trim();
    if let Ok(date) = NaiveDate::parse_from_str(label, "%Y-%m-%d") {
        return Some(date);
    }

    let rest = match label.split_once(',') {
        Some((head, tail)) if head.trim().parse::<Weekday>().is_ok() => tail.trim(),
        _ => label,
    };

    NaiveDate::parse_from_str(rest, "%b %d, %Y")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{} {}", rest, default_year), "%b %d %Y"))
        .ok()
}
