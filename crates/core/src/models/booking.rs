use std::fmt;

use serde::{Deserialize, Serialize};

use crate::date::DateKey;
use crate::models::time_slot::TimeOfDay;

/// Identifier of a staff member as the server knows it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaffId(String);

impl StaffId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Reads a staff picker value. Empty input and the picker's `"none"`
    /// entry mean no staff member is selected.
    pub fn from_picker(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("none") {
            None
        } else {
            Some(Self(value.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StaffId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceId(String);

impl ServiceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether the widget books a new appointment or moves an existing one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BookingMode {
    Request,
    Reschedule {
        appointment_request_id: String,
        /// Date of the appointment being moved; the calendar opens on it.
        original_date: Option<DateKey>,
    },
}

/// Everything the controller needs to know about the booking that does not
/// come from user interaction.
#[derive(Debug, Clone)]
pub struct BookingContext {
    pub service: ServiceId,
    /// Service duration in minutes, used for slot queries and end times.
    pub duration_minutes: i64,
    /// IANA name of the salon timezone, forwarded with submissions.
    pub timezone: String,
    pub mode: BookingMode,
    pub reason_for_rescheduling: Option<String>,
}

impl BookingContext {
    pub fn new(service: ServiceId, duration_minutes: i64, timezone: impl Into<String>) -> Self {
        Self {
            service,
            duration_minutes,
            timezone: timezone.into(),
            mode: BookingMode::Request,
            reason_for_rescheduling: None,
        }
    }

    pub fn rescheduling(
        mut self,
        appointment_request_id: impl Into<String>,
        original_date: Option<DateKey>,
        reason: Option<String>,
    ) -> Self {
        self.mode = BookingMode::Reschedule {
            appointment_request_id: appointment_request_id.into(),
            original_date,
        };
        self.reason_for_rescheduling = reason;
        self
    }

    /// Date the calendar starts on before the user picks one.
    pub fn initial_date(&self) -> Option<DateKey> {
        match &self.mode {
            BookingMode::Reschedule { original_date, .. } => *original_date,
            BookingMode::Request => None,
        }
    }
}

/// The data handed to the submission sink once a date and slot are chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    pub mode: BookingMode,
    pub date: DateKey,
    pub staff: StaffId,
    pub service: ServiceId,
    pub start_time: TimeOfDay,
    /// `start_time` plus the service duration, wrapped within the day.
    pub end_time: TimeOfDay,
    pub timezone: String,
    pub reason_for_rescheduling: Option<String>,
}

impl SubmissionPayload {
    pub fn appointment_request_id(&self) -> Option<&str> {
        match &self.mode {
            BookingMode::Reschedule {
                appointment_request_id,
                ..
            } => Some(appointment_request_id),
            BookingMode::Request => None,
        }
    }

    pub fn is_reschedule(&self) -> bool {
        matches!(self.mode, BookingMode::Reschedule { .. })
    }
}
