//! # Time Parsing Feature
//!
//! Turns free-form time phrases into absolute timestamps.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! Handles three families of input:
//! - durations, compact (`30m`, `2h`, `1h30m`) or spelled out
//!   (`2 weeks`, `in 3 hours`, `a day`)
//! - clock times (`6pm`, `6:30 pm`, `18:30`, `noon`) — the next occurrence,
//!   rolling over to tomorrow when the time already passed today
//! - `tomorrow`, optionally with a clock time (`tomorrow at 9am`)
//!
//! Returns `None` for anything it cannot understand; dialogs re-prompt.

use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Timelike, Utc};
use regex::Regex;
use std::sync::OnceLock;

fn word_duration_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:in\s+)?(\d+|an?)\s*(second|minute|min|hour|hr|day|week|month)s?$")
            .unwrap()
    })
}

fn clock_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{1,2})(?::(\d{2}))?\s*(am|pm)?$").unwrap())
}

/// Normalize a time phrase relative to `now`.
pub fn normalize(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let phrase = text.trim().to_lowercase();
    if phrase.is_empty() {
        return None;
    }

    if let Some(rest) = phrase.strip_prefix("tomorrow") {
        let rest = rest.trim().trim_start_matches("at").trim();
        let tomorrow = now + Duration::days(1);
        if rest.is_empty() {
            return Some(tomorrow);
        }
        return clock_time(rest).and_then(|t| at_time(tomorrow, t));
    }

    if let Some(secs) = word_duration(&phrase) {
        return Some(now + Duration::seconds(secs));
    }
    if let Some(secs) = compact_duration(&phrase) {
        return Some(now + Duration::seconds(secs));
    }

    if let Some(t) = clock_time(&phrase) {
        let today = at_time(now, t)?;
        // A bare clock time means the next occurrence of that time
        return if today > now {
            Some(today)
        } else {
            Some(today + Duration::days(1))
        };
    }

    None
}

/// Normalize a time phrase relative to the current wall clock.
pub fn normalize_now(text: &str) -> Option<DateTime<Utc>> {
    normalize(text, Utc::now())
}

fn at_time(day: DateTime<Utc>, t: NaiveTime) -> Option<DateTime<Utc>> {
    Utc.with_ymd_and_hms(
        day.date_naive().year(),
        day.date_naive().month(),
        day.date_naive().day(),
        t.hour(),
        t.minute(),
        0,
    )
    .single()
}

/// `2 weeks`, `in 3 hours`, `a day`, `45 min`
fn word_duration(phrase: &str) -> Option<i64> {
    let caps = word_duration_re().captures(phrase)?;
    let count = match &caps[1] {
        "a" | "an" => 1,
        n => n.parse::<i64>().ok()?,
    };
    let unit = match &caps[2] {
        "second" => 1,
        "minute" | "min" => 60,
        "hour" | "hr" => 3600,
        "day" => 86_400,
        "week" => 604_800,
        "month" => 30 * 86_400,
        _ => return None,
    };
    Some(count * unit)
}

/// Compact duration strings like `30m`, `2h`, `1d`, `1h30m`, `1w`
fn compact_duration(phrase: &str) -> Option<i64> {
    let mut total: i64 = 0;
    let mut number = String::new();

    for c in phrase.chars() {
        if c.is_ascii_digit() {
            number.push(c);
        } else if !number.is_empty() {
            let value: i64 = number.parse().ok()?;
            number.clear();
            total += match c {
                's' => value,
                'm' => value * 60,
                'h' => value * 3600,
                'd' => value * 86_400,
                'w' => value * 604_800,
                _ => return None,
            };
        } else {
            return None;
        }
    }

    // A trailing bare number is not a duration
    if total > 0 && number.is_empty() {
        Some(total)
    } else {
        None
    }
}

/// `6pm`, `6:30 pm`, `18:30`, `noon`, `midnight`
fn clock_time(phrase: &str) -> Option<NaiveTime> {
    match phrase {
        "noon" | "midday" => return NaiveTime::from_hms_opt(12, 0, 0),
        "midnight" => return NaiveTime::from_hms_opt(0, 0, 0),
        _ => {}
    }

    let caps = clock_re().captures(phrase)?;
    let mut hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps.get(2).map_or(Some(0), |m| m.as_str().parse().ok())?;
    let meridiem = caps.get(3).map(|m| m.as_str());

    match meridiem {
        Some("pm") if hour < 12 => hour += 12,
        Some("am") if hour == 12 => hour = 0,
        // A bare hour without am/pm only makes sense in 24h form
        None if caps.get(2).is_none() => return None,
        _ => {}
    }

    NaiveTime::from_hms_opt(hour, minute, 0)
}
