//! Request and response bodies exchanged with the booking server.
//!
//! Both page generations are understood: the older one posts form fields
//! (`selected_date`, `staff_member`) and answers with `available_slots`, the
//! newer one posts JSON (`date`, `staff_id`) and answers with `slots`.

use serde::{Deserialize, Serialize};

use salonbook_core::models::booking::SubmissionPayload;
use salonbook_core::time;

#[derive(Debug, Serialize)]
pub(crate) struct SlotQueryJson<'a> {
    pub date: String,
    pub staff_id: &'a str,
    pub service_id: &'a str,
    pub duration: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct SlotQueryForm<'a> {
    pub selected_date: String,
    pub staff_member: &'a str,
    pub service_id: &'a str,
    pub duration: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct StaffQueryJson<'a> {
    pub staff_id: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct StaffQueryForm<'a> {
    pub staff_member: &'a str,
}

/// Fields every answer may carry alongside its data.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct Envelope {
    pub success: Option<bool>,
    #[serde(default)]
    pub error: bool,
    pub message: Option<String>,
}

impl Envelope {
    pub fn is_rejection(&self) -> bool {
        self.error || self.success == Some(false)
    }

    pub fn message_or(&self, fallback: &str) -> String {
        self.message.clone().unwrap_or_else(|| fallback.to_string())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SlotsResponse {
    #[serde(flatten)]
    pub envelope: Envelope,
    pub slots: Option<Vec<String>>,
    pub available_slots: Option<Vec<String>>,
}

impl SlotsResponse {
    pub fn labels(self) -> Vec<String> {
        self.slots.or(self.available_slots).unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct NonWorkingDaysResponse {
    #[serde(flatten)]
    pub envelope: Envelope,
    #[serde(default)]
    pub non_working_days: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NextAvailableResponse {
    #[serde(flatten)]
    pub envelope: Envelope,
    #[serde(default)]
    pub next_available_date: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmissionResponse {
    #[serde(flatten)]
    pub envelope: Envelope,
    pub redirect_url: Option<String>,
}

/// Form fields of an appointment request or reschedule submission.
#[derive(Debug, Serialize)]
pub(crate) struct SubmissionForm<'a> {
    pub service_id: &'a str,
    pub staff_member: &'a str,
    pub date_selected: String,
    pub time_selected: String,
    pub end_time: String,
    pub timezone: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment_request_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason_for_rescheduling: Option<&'a str>,
}

impl<'a> From<&'a SubmissionPayload> for SubmissionForm<'a> {
    fn from(payload: &'a SubmissionPayload) -> Self {
        Self {
            service_id: payload.service.as_str(),
            staff_member: payload.staff.as_str(),
            date_selected: payload.date.to_string(),
            time_selected: time::format_24h(payload.start_time),
            end_time: time::format_24h(payload.end_time),
            timezone: &payload.timezone,
            appointment_request_id: payload.appointment_request_id(),
            reason_for_rescheduling: payload
                .reason_for_rescheduling
                .as_deref()
                .filter(|_| payload.is_reschedule()),
        }
    }
}
