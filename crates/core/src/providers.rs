//! Collaborators the controller talks to. Implementations live in the
//! integration layer (see `salonbook-client`); tests substitute mocks.

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::date::DateKey;
use crate::errors::{ProviderError, SubmissionError};
use crate::models::booking::{ServiceId, StaffId, SubmissionPayload};
use crate::models::time_slot::TimeSlot;

/// A day's slots together with whatever the server said about them, such
/// as `No availability` for an empty day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DaySlots {
    pub slots: Vec<TimeSlot>,
    pub message: Option<String>,
}

#[async_trait]
pub trait AvailabilityProvider: Send + Sync {
    /// Bookable slots for `staff` on `date`, each `duration` minutes long.
    async fn fetch_slots(
        &self,
        date: DateKey,
        staff: &StaffId,
        service: &ServiceId,
        duration: i64,
    ) -> Result<Vec<TimeSlot>, ProviderError>;

    /// [`fetch_slots`](Self::fetch_slots) plus the server's message. Providers
    /// without one keep the default.
    async fn fetch_day(
        &self,
        date: DateKey,
        staff: &StaffId,
        service: &ServiceId,
        duration: i64,
    ) -> Result<DaySlots, ProviderError> {
        let slots = self.fetch_slots(date, staff, service, duration).await?;
        Ok(DaySlots { slots, message: None })
    }
}

#[async_trait]
pub trait NonWorkingDaysProvider: Send + Sync {
    async fn fetch(&self, staff: Option<&StaffId>) -> Result<BTreeSet<DateKey>, ProviderError>;
}

/// Outcome of a next-available-date lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextAvailable {
    Found(DateKey),
    /// The server had no date to offer; carries its explanation.
    Unavailable(String),
}

#[async_trait]
pub trait NextAvailableProvider: Send + Sync {
    async fn next_available(
        &self,
        staff: &StaffId,
        service: &ServiceId,
    ) -> Result<NextAvailable, ProviderError>;
}

#[async_trait]
pub trait SubmissionSink: Send + Sync {
    async fn submit(&self, payload: &SubmissionPayload) -> Result<(), SubmissionError>;
}
