//! # HTTP Booking Client
//!
//! Implements the controller's collaborator traits against the booking
//! server's AJAX endpoints. Every call is a single `POST`; nothing is retried
//! and nothing is cached.

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use eyre::{eyre, Result, WrapErr};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use salonbook_core::date::DateKey;
use salonbook_core::errors::{ProviderError, SubmissionError};
use salonbook_core::models::booking::{ServiceId, StaffId, SubmissionPayload};
use salonbook_core::models::time_slot::TimeSlot;
use salonbook_core::providers::{
    AvailabilityProvider, DaySlots, NextAvailable, NextAvailableProvider, NonWorkingDaysProvider,
    SubmissionSink,
};

use crate::config::{ClientConfig, RequestEncoding};
use crate::wire::{
    NextAvailableResponse, NonWorkingDaysResponse, SlotQueryForm, SlotQueryJson, SlotsResponse,
    StaffQueryForm, StaffQueryJson, SubmissionForm, SubmissionResponse,
};

pub struct HttpBookingClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl HttpBookingClient {
    /// Builds the client with the AJAX and CSRF headers the server expects.
    ///
    /// # Errors
    ///
    /// Fails if the CSRF token is not a valid header value or the TLS backend
    /// cannot be initialised.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert("X-Requested-With", HeaderValue::from_static("XMLHttpRequest"));
        if let Some(token) = &config.csrf_token {
            let value = HeaderValue::from_str(token)
                .wrap_err("BOOKING_CSRF_TOKEN is not a valid header value")?;
            headers.insert("X-CSRFToken", value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout))
            .build()
            .wrap_err("Failed to build HTTP client")?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Attaches `json` or `form` as the body, per the configured encoding.
    fn with_body<J: Serialize, F: Serialize>(&self, request: RequestBuilder, json: &J, form: &F) -> RequestBuilder {
        match self.config.encoding {
            RequestEncoding::Json => request.json(json),
            RequestEncoding::Form => request.form(form),
        }
    }

    /// Sends the request and returns the body of a 2xx answer.
    async fn send(&self, request: RequestBuilder) -> Result<String> {
        let response = request.send().await.wrap_err("Request to booking server failed")?;
        let status = response.status();
        let body = response
            .text()
            .await
            .wrap_err("Failed to read booking server response")?;

        if !status.is_success() {
            return Err(eyre!("Booking server answered {}: {}", status, body));
        }
        Ok(body)
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ProviderError> {
    serde_json::from_str(body).map_err(|e| ProviderError::Malformed(e.to_string()))
}

#[async_trait]
impl AvailabilityProvider for HttpBookingClient {
    async fn fetch_slots(
        &self,
        date: DateKey,
        staff: &StaffId,
        service: &ServiceId,
        duration: i64,
    ) -> Result<Vec<TimeSlot>, ProviderError> {
        Ok(self.fetch_day(date, staff, service, duration).await?.slots)
    }

    /// Labels that do not parse, or whose slot would run past midnight, are
    /// skipped so one bad entry does not hide the rest of the day.
    async fn fetch_day(
        &self,
        date: DateKey,
        staff: &StaffId,
        service: &ServiceId,
        duration: i64,
    ) -> Result<DaySlots, ProviderError> {
        let url = self.config.url(&self.config.endpoints.available_slots);
        let json = SlotQueryJson {
            date: date.to_string(),
            staff_id: staff.as_str(),
            service_id: service.as_str(),
            duration,
        };
        let form = SlotQueryForm {
            selected_date: date.to_string(),
            staff_member: staff.as_str(),
            service_id: service.as_str(),
            duration,
        };

        debug!(%url, encoding = %self.config.encoding, "querying available slots");
        let body = self.send(self.with_body(self.http.post(&url), &json, &form)).await?;
        let response: SlotsResponse = decode(&body)?;
        if response.envelope.is_rejection() {
            return Err(ProviderError::Rejected(
                response.envelope.message_or("Error fetching available slots"),
            ));
        }

        let message = response.envelope.message.clone();
        let slots = response
            .labels()
            .iter()
            .filter_map(|label| match TimeSlot::from_label(label, duration) {
                Ok(slot) => Some(slot),
                Err(err) => {
                    warn!(%date, %label, error = %err, "skipping unusable slot label");
                    None
                }
            })
            .collect();

        Ok(DaySlots { slots, message })
    }
}

#[async_trait]
impl NonWorkingDaysProvider for HttpBookingClient {
    async fn fetch(&self, staff: Option<&StaffId>) -> Result<BTreeSet<DateKey>, ProviderError> {
        let Some(staff) = staff else {
            return Ok(BTreeSet::new());
        };

        let url = self.config.url(&self.config.endpoints.non_working_days);
        let json = StaffQueryJson {
            staff_id: staff.as_str(),
        };
        let form = StaffQueryForm {
            staff_member: staff.as_str(),
        };

        debug!(%url, %staff, "querying non-working days");
        let body = self.send(self.with_body(self.http.post(&url), &json, &form)).await?;
        let response: NonWorkingDaysResponse = decode(&body)?;
        if response.envelope.is_rejection() {
            return Err(ProviderError::Rejected(
                response.envelope.message_or("Error fetching non-working days"),
            ));
        }

        response
            .non_working_days
            .iter()
            .map(|day| {
                DateKey::parse(day).map_err(|e| ProviderError::Malformed(format!("non-working day: {e}")))
            })
            .collect()
    }
}

#[async_trait]
impl NextAvailableProvider for HttpBookingClient {
    async fn next_available(
        &self,
        staff: &StaffId,
        service: &ServiceId,
    ) -> Result<NextAvailable, ProviderError> {
        let path = self
            .config
            .endpoints
            .next_available
            .replace("{service}", service.as_str());
        let url = self.config.url(&path);
        let json = StaffQueryJson {
            staff_id: staff.as_str(),
        };
        let form = StaffQueryForm {
            staff_member: staff.as_str(),
        };

        debug!(%url, %staff, "querying next available date");
        let body = self.send(self.with_body(self.http.post(&url), &json, &form)).await?;
        let response: NextAvailableResponse = decode(&body)?;
        if response.envelope.is_rejection() || response.next_available_date.is_empty() {
            return Ok(NextAvailable::Unavailable(
                response.envelope.message_or("No available slots found"),
            ));
        }

        // Servers send either a bare date or an ISO datetime.
        let date = response.next_available_date.get(..10).unwrap_or_default();
        DateKey::parse(date)
            .map(NextAvailable::Found)
            .map_err(|e| ProviderError::Malformed(format!("next available date: {e}")))
    }
}

#[async_trait]
impl SubmissionSink for HttpBookingClient {
    async fn submit(&self, payload: &SubmissionPayload) -> Result<(), SubmissionError> {
        let path = if payload.is_reschedule() {
            &self.config.endpoints.reschedule
        } else {
            &self.config.endpoints.submit
        };
        let url = self.config.url(path);
        let form = SubmissionForm::from(payload);

        info!(%url, date = %payload.date, time = %form.time_selected, "submitting appointment");
        let body = self.send(self.http.post(&url).form(&form)).await?;
        let response: SubmissionResponse = serde_json::from_str(&body)
            .map_err(|e| SubmissionError::Transport(eyre!("Invalid submission response: {e}")))?;

        if response.envelope.is_rejection() || response.envelope.success != Some(true) {
            let message = response.envelope.message_or("Error submitting appointment.");
            warn!(%message, "submission rejected");
            return Err(SubmissionError::Rejected(message));
        }

        if let Some(redirect) = &response.redirect_url {
            debug!(%redirect, "submission accepted");
        }
        Ok(())
    }
}
