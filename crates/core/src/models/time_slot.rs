use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{BookingError, BookingResult};
use crate::time;

/// A wall-clock time within a single day, without any timezone attached.
///
/// Serialized in the server's `HH:MM` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay {
    hour: u32,
    minute: u32,
}

impl TimeOfDay {
    pub const MIDNIGHT: TimeOfDay = TimeOfDay { hour: 0, minute: 0 };

    pub fn new(hour: u32, minute: u32) -> BookingResult<Self> {
        if hour > 23 || minute > 59 {
            return Err(BookingError::InvalidTime { hour, minute });
        }
        Ok(Self { hour, minute })
    }

    /// Builds a time from minutes since midnight, wrapping modulo one day.
    pub fn from_minutes(minutes: i64) -> Self {
        let wrapped = minutes.rem_euclid(time::MINUTES_PER_DAY) as u32;
        Self {
            hour: wrapped / 60,
            minute: wrapped % 60,
        }
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = BookingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        time::parse_24h(&value)
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.to_string()
    }
}

/// A half-open `[start, end)` span inside one day.
///
/// An end of `00:00` means the end of the day, so `23:30-00:00` is a valid
/// thirty minute interval. Otherwise `start < end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Interval {
    start: TimeOfDay,
    end: TimeOfDay,
}

impl Interval {
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> BookingResult<Self> {
        let ends_at_midnight = end == TimeOfDay::MIDNIGHT && start != TimeOfDay::MIDNIGHT;
        if start >= end && !ends_at_midnight {
            return Err(BookingError::InvalidInterval { start, end });
        }
        Ok(Self { start, end })
    }

    /// Interval starting at `start` and lasting `duration` minutes.
    ///
    /// Ending exactly at midnight is allowed; ending later fails, since
    /// intervals never span two dates.
    pub fn starting_at(start: TimeOfDay, duration: i64) -> BookingResult<Self> {
        let end = time::to_minutes(start) + duration;
        if duration <= 0 || end > time::MINUTES_PER_DAY {
            return Err(BookingError::InvalidInterval {
                start,
                end: time::add_minutes(start, duration),
            });
        }
        Self::new(start, TimeOfDay::from_minutes(end))
    }

    pub fn start(&self) -> TimeOfDay {
        self.start
    }

    pub fn end(&self) -> TimeOfDay {
        self.end
    }

    pub fn start_minute(&self) -> i64 {
        time::to_minutes(self.start)
    }

    /// Minutes since midnight of the end, `1440` for an end-of-day interval.
    pub fn end_minute(&self) -> i64 {
        match time::to_minutes(self.end) {
            0 => time::MINUTES_PER_DAY,
            m => m,
        }
    }

    pub fn duration_minutes(&self) -> i64 {
        self.end_minute() - self.start_minute()
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// A bookable interval as offered by the availability provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeSlot {
    pub interval: Interval,
    pub label: String,
}

impl TimeSlot {
    pub fn new(label: impl Into<String>, interval: Interval) -> Self {
        Self {
            interval,
            label: label.into(),
        }
    }

    /// Parses a provider label (`9:00 AM` or `09:00`) into a slot lasting
    /// `duration` minutes. The label is kept verbatim for display.
    pub fn from_label(label: &str, duration: i64) -> BookingResult<Self> {
        let start = time::parse_slot_label(label)?;
        let interval = Interval::starting_at(start, duration)?;
        Ok(Self::new(label.trim(), interval))
    }

    pub fn start(&self) -> TimeOfDay {
        self.interval.start()
    }

    pub fn end(&self) -> TimeOfDay {
        self.interval.end()
    }
}
