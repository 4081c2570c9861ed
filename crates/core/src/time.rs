//! # Time Arithmetic
//!
//! Conversions between the time-of-day representations the widget deals
//! with: minutes since midnight, the 12-hour display form shown to users
//! (`1:05 PM`) and the 24-hour wire form the server expects (`13:05`).
//!
//! All arithmetic stays within one day. [`add_minutes`] wraps modulo 24 hours
//! and never carries into the next date; callers that need cross-midnight
//! semantics must roll the date over themselves.

use crate::errors::{BookingError, BookingResult};
use crate::models::time_slot::TimeOfDay;

pub const MINUTES_PER_DAY: i64 = 24 * 60;

pub fn to_minutes(t: TimeOfDay) -> i64 {
    i64::from(t.hour()) * 60 + i64::from(t.minute())
}

/// Adds `duration` minutes to `t`, wrapping around midnight.
///
/// `add_minutes(11:30 PM, 60)` is `12:30 AM` of the *same* date as far as this
/// function knows.
pub fn add_minutes(t: TimeOfDay, duration: i64) -> TimeOfDay {
    TimeOfDay::from_minutes(to_minutes(t) + duration)
}

/// Renders `t` on a 12-hour clock, e.g. `13:05` becomes `1:05 PM`.
pub fn format_display(t: TimeOfDay) -> String {
    let suffix = if t.hour() >= 12 { "PM" } else { "AM" };
    let hour = match t.hour() % 12 {
        0 => 12,
        h => h,
    };
    format!("{}:{:02} {}", hour, t.minute(), suffix)
}

/// Parses the `H:MM AM|PM` form produced by [`format_display`].
///
/// The suffix is case-insensitive; the hour may carry a leading zero.
pub fn parse_display(s: &str) -> BookingResult<TimeOfDay> {
    let trimmed = s.trim();
    let (clock, suffix) = trimmed
        .split_once(' ')
        .ok_or_else(|| BookingError::parse(format!("expected 'H:MM AM|PM', got '{s}'")))?;

    let pm = if suffix.eq_ignore_ascii_case("pm") {
        true
    } else if suffix.eq_ignore_ascii_case("am") {
        false
    } else {
        return Err(BookingError::parse(format!("unknown meridiem '{suffix}' in '{s}'")));
    };

    let (hour, minute) = split_clock(clock, s)?;
    if !(1..=12).contains(&hour) {
        return Err(BookingError::parse(format!("hour out of range in '{s}'")));
    }

    let hour = match (hour, pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, false) => h,
        (h, true) => h + 12,
    };
    TimeOfDay::new(hour, minute).map_err(|_| BookingError::parse(format!("minute out of range in '{s}'")))
}

/// Renders `t` as zero-padded `HH:MM`.
pub fn format_24h(t: TimeOfDay) -> String {
    t.to_string()
}

/// Parses zero-padded or unpadded `HH:MM` on a 24-hour clock.
pub fn parse_24h(s: &str) -> BookingResult<TimeOfDay> {
    let (hour, minute) = split_clock(s.trim(), s)?;
    TimeOfDay::new(hour, minute).map_err(|_| BookingError::parse(format!("time out of range in '{s}'")))
}

/// Parses a slot label in whichever form the server sent it.
pub fn parse_slot_label(label: &str) -> BookingResult<TimeOfDay> {
    if label.trim().contains(' ') {
        parse_display(label)
    } else {
        parse_24h(label)
    }
}

/// Human readable duration: `1 hour 30 minutes`, `2 hours`, `45 minutes`.
pub fn format_duration(minutes: i64) -> String {
    let hours = minutes / 60;
    let mins = minutes % 60;
    let plural = |n: i64, unit: &str| {
        if n == 1 {
            format!("{n} {unit}")
        } else {
            format!("{n} {unit}s")
        }
    };

    match (hours, mins) {
        (h, 0) if h > 0 => plural(h, "hour"),
        (h, m) if h > 0 => format!("{} {}", plural(h, "hour"), plural(m, "minute")),
        (_, m) => plural(m, "minute"),
    }
}

/// Formats an amount in cents with two decimals, e.g. `1250` as `$12.50`.
pub fn format_price(cents: i64, currency_symbol: &str) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{currency_symbol}{}.{:02}", abs / 100, abs % 100)
}

fn split_clock(clock: &str, original: &str) -> BookingResult<(u32, u32)> {
    let (hour, minute) = clock
        .split_once(':')
        .ok_or_else(|| BookingError::parse(format!("missing ':' in '{original}'")))?;

    let digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    if !digits(hour) || hour.len() > 2 || !digits(minute) || minute.len() != 2 {
        return Err(BookingError::parse(format!("malformed time '{original}'")));
    }

    let hour = hour.parse().map_err(|_| BookingError::parse(format!("malformed hour in '{original}'")))?;
    let minute = minute.parse().map_err(|_| BookingError::parse(format!("malformed minute in '{original}'")))?;
    Ok((hour, minute))
}
