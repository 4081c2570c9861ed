//! # Client Configuration
//!
//! Settings for talking to the booking server, read from environment
//! variables (a `.env` file is honoured by the binary through `dotenv`).
//!
//! ## Environment Variables
//!
//! - `BOOKING_BASE_URL`: server root, e.g. `https://salon.example.com` (required)
//! - `BOOKING_REQUEST_ENCODING`: `json` or `form` (default: `json`)
//! - `BOOKING_CSRF_TOKEN`: sent as `X-CSRFToken` when set
//! - `BOOKING_TIMEZONE`: IANA zone of the salon (default: `UTC`)
//! - `BOOKING_LOCALE`: display locale (default: `en-US`)
//! - `BOOKING_REQUEST_TIMEOUT_SECONDS`: HTTP timeout (default: 30)
//! - `BOOKING_SLOTS_PATH`, `BOOKING_NON_WORKING_DAYS_PATH`,
//!   `BOOKING_NEXT_AVAILABLE_PATH`, `BOOKING_SUBMIT_PATH`,
//!   `BOOKING_RESCHEDULE_PATH`: endpoint overrides
//! - `LOG_LEVEL`: tracing level (default: `info`)

use std::env;
use std::fmt;
use std::str::FromStr;

use chrono_tz::Tz;
use eyre::{eyre, Result, WrapErr};
use salonbook_core::date::LocaleTag;
use tracing::Level;

/// How query bodies are encoded. The two generations of the booking page
/// differ only in this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestEncoding {
    #[default]
    Json,
    Form,
}

impl FromStr for RequestEncoding {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(RequestEncoding::Json),
            "form" | "form-urlencoded" => Ok(RequestEncoding::Form),
            other => Err(eyre!("unknown request encoding '{other}', expected 'json' or 'form'")),
        }
    }
}

impl fmt::Display for RequestEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestEncoding::Json => f.write_str("json"),
            RequestEncoding::Form => f.write_str("form"),
        }
    }
}

/// Endpoint paths relative to the base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub available_slots: String,
    pub non_working_days: String,
    /// May contain `{service}`, replaced by the service id.
    pub next_available: String,
    pub submit: String,
    pub reschedule: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            available_slots: "/reservations/available_slots/".to_string(),
            non_working_days: "/reservations/request_staff_info/".to_string(),
            next_available: "/reservations/request_next_available_slot/{service}/".to_string(),
            submit: "/reservations/appointment-request-submit/".to_string(),
            reschedule: "/reservations/appointment-reschedule-submit/".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub encoding: RequestEncoding,
    pub csrf_token: Option<String>,
    pub timezone: Tz,
    pub locale: LocaleTag,
    /// Request timeout in seconds
    pub request_timeout: u64,
    pub log_level: Level,
    pub endpoints: Endpoints,
}

impl ClientConfig {
    /// Configuration with defaults for everything but the server address.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            encoding: RequestEncoding::default(),
            csrf_token: None,
            timezone: Tz::UTC,
            locale: LocaleTag::default(),
            request_timeout: 30,
            log_level: Level::INFO,
            endpoints: Endpoints::default(),
        }
    }

    /// Reads the configuration from the environment.
    ///
    /// # Errors
    ///
    /// Fails if `BOOKING_BASE_URL` is missing, or if the encoding, timezone
    /// or timeout values cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let base_url = env::var("BOOKING_BASE_URL")
            .wrap_err("BOOKING_BASE_URL environment variable must be set")?;
        let mut config = Self::new(base_url);

        if let Ok(encoding) = env::var("BOOKING_REQUEST_ENCODING") {
            config.encoding = encoding
                .parse()
                .wrap_err("Invalid BOOKING_REQUEST_ENCODING value")?;
        }

        config.csrf_token = env::var("BOOKING_CSRF_TOKEN").ok().filter(|t| !t.is_empty());

        if let Ok(timezone) = env::var("BOOKING_TIMEZONE") {
            config.timezone = timezone
                .parse::<Tz>()
                .map_err(|e| eyre!("Invalid BOOKING_TIMEZONE value: {e}"))?;
        }

        if let Ok(locale) = env::var("BOOKING_LOCALE") {
            config.locale = LocaleTag::parse(&locale);
        }

        if let Ok(timeout) = env::var("BOOKING_REQUEST_TIMEOUT_SECONDS") {
            config.request_timeout = timeout
                .parse()
                .wrap_err("Invalid BOOKING_REQUEST_TIMEOUT_SECONDS value")?;
        }

        config.log_level = match env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()).as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };

        let overrides = [
            ("BOOKING_SLOTS_PATH", &mut config.endpoints.available_slots),
            ("BOOKING_NON_WORKING_DAYS_PATH", &mut config.endpoints.non_working_days),
            ("BOOKING_NEXT_AVAILABLE_PATH", &mut config.endpoints.next_available),
            ("BOOKING_SUBMIT_PATH", &mut config.endpoints.submit),
            ("BOOKING_RESCHEDULE_PATH", &mut config.endpoints.reschedule),
        ];
        for (var, slot) in overrides {
            if let Ok(path) = env::var(var) {
                *slot = path;
            }
        }

        Ok(config)
    }

    /// Absolute URL for an endpoint path.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn timezone_name(&self) -> &'static str {
        self.timezone.name()
    }
}
