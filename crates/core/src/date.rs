//! # Date Formatting
//!
//! Calendar dates travel between the widget and the server as [`DateKey`]s,
//! the zero-padded `YYYY-MM-DD` form. Keys are always built from explicit
//! year/month/day fields and parsed by position, never through locale or
//! timezone aware string conversion, so the same calendar day yields the
//! same key regardless of where the code runs.
//!
//! Human readable dates are produced per [`LocaleTag`] using chrono's
//! localized month and weekday names.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::errors::{BookingError, BookingResult};

pub type CalendarDate = NaiveDate;

/// Canonical identifier of a calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DateKey(NaiveDate);

impl DateKey {
    /// Parses exactly `YYYY-MM-DD` (ten characters, zero padded).
    pub fn parse(s: &str) -> BookingResult<Self> {
        let bytes = s.as_bytes();
        let shape_ok = bytes.len() == 10
            && bytes[4] == b'-'
            && bytes[7] == b'-'
            && bytes
                .iter()
                .enumerate()
                .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
        if !shape_ok {
            return Err(BookingError::parse(format!("expected YYYY-MM-DD, got '{s}'")));
        }

        let field = |range: std::ops::Range<usize>| -> BookingResult<u32> {
            s[range]
                .parse()
                .map_err(|_| BookingError::parse(format!("malformed date '{s}'")))
        };
        let year = field(0..4)? as i32;
        let month = field(5..7)?;
        let day = field(8..10)?;

        NaiveDate::from_ymd_opt(year, month, day)
            .map(DateKey)
            .ok_or_else(|| BookingError::parse(format!("no such calendar date '{s}'")))
    }

    pub fn date(&self) -> CalendarDate {
        self.0
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.0.year(), self.0.month(), self.0.day())
    }
}

impl FromStr for DateKey {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DateKey::parse(s)
    }
}

impl TryFrom<String> for DateKey {
    type Error = BookingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        DateKey::parse(&value)
    }
}

impl From<DateKey> for String {
    fn from(value: DateKey) -> Self {
        value.to_string()
    }
}

impl From<CalendarDate> for DateKey {
    fn from(value: CalendarDate) -> Self {
        canonical_key(value)
    }
}

/// A display locale such as `en-US` or `de_CH`.
///
/// Unknown tags fall back to `en_US`; a date is always displayable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocaleTag {
    locale: chrono::Locale,
    language: Language,
    us_order: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Language {
    English,
    German,
    French,
    Spanish,
    Italian,
    Dutch,
    Portuguese,
    Other,
}

impl LocaleTag {
    pub fn parse(tag: &str) -> Self {
        let mut parts = tag.trim().split(['-', '_']);
        let language = parts.next().unwrap_or_default().to_ascii_lowercase();
        let region = parts.next().map(|r| r.to_ascii_uppercase());

        let region = region.unwrap_or_else(|| default_region(&language).to_string());
        let name = format!("{language}_{region}");

        match chrono::Locale::try_from(name.as_str()) {
            Ok(locale) => Self {
                locale,
                language: Language::from_code(&language),
                us_order: language == "en" && region == "US",
            },
            Err(_) => Self::default(),
        }
    }

    pub fn locale(&self) -> chrono::Locale {
        self.locale
    }

    fn long_pattern(&self) -> &'static str {
        match self.language {
            Language::English if self.us_order => "%A, %B %-d, %Y",
            Language::English => "%A %-d %B %Y",
            Language::German => "%A, %-d. %B %Y",
            Language::Spanish | Language::Portuguese => "%A, %-d de %B de %Y",
            Language::French | Language::Italian | Language::Dutch | Language::Other => "%A %-d %B %Y",
        }
    }

    fn medium_pattern(&self) -> &'static str {
        match self.language {
            Language::English if self.us_order => "%B %-d, %Y",
            Language::English => "%-d %B %Y",
            Language::German => "%-d. %B %Y",
            Language::Spanish | Language::Portuguese => "%-d de %B de %Y",
            Language::French | Language::Italian | Language::Dutch | Language::Other => "%-d %B %Y",
        }
    }
}

impl Default for LocaleTag {
    fn default() -> Self {
        Self {
            locale: chrono::Locale::en_US,
            language: Language::English,
            us_order: true,
        }
    }
}

impl Language {
    fn from_code(code: &str) -> Self {
        match code {
            "en" => Language::English,
            "de" => Language::German,
            "fr" => Language::French,
            "es" => Language::Spanish,
            "it" => Language::Italian,
            "nl" => Language::Dutch,
            "pt" => Language::Portuguese,
            _ => Language::Other,
        }
    }
}

fn default_region(language: &str) -> &str {
    match language {
        "en" => "US",
        "de" => "DE",
        "fr" => "FR",
        "es" => "ES",
        "it" => "IT",
        "nl" => "NL",
        "pt" => "PT",
        "ja" => "JP",
        "sv" => "SE",
        "da" => "DK",
        _ => "",
    }
}

pub fn canonical_key(d: CalendarDate) -> DateKey {
    DateKey(d)
}

/// True iff `key` falls on a day strictly before `today`.
pub fn is_past(key: DateKey, today: CalendarDate) -> bool {
    key.date() < today
}

/// Weekday, month name, day and year, e.g. `Tuesday, April 15, 2025`.
pub fn display_long(key: DateKey, locale: LocaleTag) -> String {
    localized(key, locale.long_pattern(), locale)
}

/// Month name, day and year without the weekday, e.g. `April 15, 2025`.
pub fn display_medium(key: DateKey, locale: LocaleTag) -> String {
    localized(key, locale.medium_pattern(), locale)
}

/// The current calendar date in the salon's timezone.
pub fn today_in(tz: Tz) -> CalendarDate {
    Utc::now().with_timezone(&tz).date_naive()
}

fn localized(key: DateKey, pattern: &str, locale: LocaleTag) -> String {
    // Midnight UTC of the key's own date; only date fields are formatted.
    let at_midnight = Utc.from_utc_datetime(&key.date().and_time(NaiveTime::MIN));
    at_midnight.format_localized(pattern, locale.locale()).to_string()
}
