//! # Slot Selection Controller
//!
//! Owns the widget state that the booking page used to keep in loose
//! variables: the chosen date and staff member, the slots loaded for them,
//! the selected slot, the staff member's non-working days and the last
//! next-available-date answer.
//!
//! ## Load state
//!
//! ```text
//! Idle -> Loading -> Loaded(slots)
//!                 -> Failed(reason)
//! ```
//!
//! Only one availability request is in flight at a time. A call to
//! [`SlotSelectionController::request_slots`] while `Loading` is dropped, not
//! queued; the first request wins. The one exception is a staff change: the
//! in-flight answer is then discarded and the slots reload for the new staff
//! member once it lands. There is no timeout here, so
//! a provider that never answers leaves the controller in `Loading`. The HTTP
//! client bounds its requests for that reason.
//!
//! ## Notifications
//!
//! Every change is broadcast as a [`StateChange`]. Shells subscribe with
//! [`SlotSelectionController::subscribe`] and re-render; they never mutate
//! controller state directly.

use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::date::{self, CalendarDate, DateKey};
use crate::errors::{BookingError, BookingResult, SubmissionError};
use crate::models::booking::{BookingContext, StaffId, SubmissionPayload};
use crate::models::time_slot::{Interval, TimeSlot};
use crate::overlap;
use crate::providers::{
    AvailabilityProvider, NextAvailable, NextAvailableProvider, NonWorkingDaysProvider,
    SubmissionSink,
};
use crate::time;

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    NoStaffSelected,
    Provider(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading {
        date: DateKey,
        staff: StaffId,
    },
    Loaded {
        date: DateKey,
        staff: StaffId,
        slots: Vec<TimeSlot>,
        /// The provider's remark, e.g. why the day is empty.
        message: Option<String>,
    },
    Failed {
        date: DateKey,
        reason: FailureReason,
    },
}

impl LoadState {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading { .. })
    }

    pub fn slots(&self) -> &[TimeSlot] {
        match self {
            LoadState::Loaded { slots, .. } => slots,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    NoneSelected,
    Selected(TimeSlot),
}

/// Owned copy of the controller state, for rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControllerState {
    pub date: Option<DateKey>,
    pub staff: Option<StaffId>,
    pub load: LoadState,
    pub selection: Selection,
    pub non_working_days: BTreeSet<DateKey>,
    pub next_available: Option<NextAvailable>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateChange {
    DateChanged(DateKey),
    StaffChanged(Option<StaffId>),
    LoadStateChanged(LoadState),
    SelectionChanged(Selection),
    NonWorkingDaysChanged(BTreeSet<DateKey>),
    NextAvailableChanged(NextAvailable),
    /// The user picked a non-working day; nothing else changed.
    DateRejected(DateKey),
}

/// The collaborators a controller queries.
#[derive(Clone)]
pub struct Providers {
    pub availability: Arc<dyn AvailabilityProvider>,
    pub non_working_days: Arc<dyn NonWorkingDaysProvider>,
    pub next_available: Arc<dyn NextAvailableProvider>,
}

impl Providers {
    /// Uses one object, typically an HTTP client, for every query.
    pub fn from_shared<P>(provider: Arc<P>) -> Self
    where
        P: AvailabilityProvider + NonWorkingDaysProvider + NextAvailableProvider + 'static,
    {
        Self {
            availability: provider.clone(),
            non_working_days: provider.clone(),
            next_available: provider,
        }
    }
}

pub struct SlotSelectionController {
    context: BookingContext,
    providers: Providers,
    state: Mutex<ControllerState>,
    events: broadcast::Sender<StateChange>,
    /// Set when the staff member changed while a load was in flight.
    staff_reload: AtomicBool,
}

impl SlotSelectionController {
    pub fn new(context: BookingContext, providers: Providers) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            context,
            providers,
            state: Mutex::new(ControllerState::default()),
            events,
            staff_reload: AtomicBool::new(false),
        }
    }

    /// Sets the staff member preselected by the page before anything loads.
    pub fn with_staff(mut self, staff: Option<StaffId>) -> Self {
        self.state.get_mut().staff = staff;
        self
    }

    pub fn context(&self) -> &BookingContext {
        &self.context
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> ControllerState {
        self.state.lock().await.clone()
    }

    /// Initial page load: non-working days for the preselected staff member,
    /// then slots for the reschedule date or `today`.
    pub async fn start(&self, today: CalendarDate) {
        let (date, staff) = {
            let mut state = self.state.lock().await;
            let date = state
                .date
                .or_else(|| self.context.initial_date())
                .unwrap_or_else(|| date::canonical_key(today));
            self.set_date(&mut state, date);
            (date, state.staff.clone())
        };

        self.load_non_working_days(staff.as_ref()).await;
        self.request_slots(date, staff).await;
    }

    /// Loads slots for `staff` on `date`.
    ///
    /// While another request is in flight the call does nothing, including
    /// one without a staff member. Otherwise, without a staff member the load
    /// fails immediately with [`FailureReason::NoStaffSelected`]. Starting a
    /// load discards the previous slots and any selection made from them.
    pub async fn request_slots(&self, date: DateKey, staff: Option<StaffId>) {
        let mut next = Some((date, staff));
        while let Some((date, staff)) = next.take() {
            next = self.load_slots(date, staff).await;
        }
    }

    /// One availability round trip. Returns the reload to run when the staff
    /// member changed while it was in flight.
    async fn load_slots(&self, date: DateKey, staff: Option<StaffId>) -> Option<(DateKey, Option<StaffId>)> {
        let staff = {
            let mut state = self.state.lock().await;

            if state.load.is_loading() {
                debug!(%date, ?staff, "availability request already in flight, dropping");
                return None;
            }

            let Some(staff) = staff else {
                debug!(%date, "no staff member selected, not querying availability");
                self.set_date(&mut state, date);
                self.clear_selection_locked(&mut state);
                self.set_load(
                    &mut state,
                    LoadState::Failed {
                        date,
                        reason: FailureReason::NoStaffSelected,
                    },
                );
                return None;
            };

            self.set_date(&mut state, date);
            self.clear_selection_locked(&mut state);
            self.set_load(
                &mut state,
                LoadState::Loading {
                    date,
                    staff: staff.clone(),
                },
            );
            staff
        };

        info!(%date, %staff, service = %self.context.service, "fetching available slots");
        let result = self
            .providers
            .availability
            .fetch_day(date, &staff, &self.context.service, self.context.duration_minutes)
            .await;

        let mut state = self.state.lock().await;
        let reload = self
            .staff_reload
            .swap(false, Ordering::SeqCst)
            .then(|| (state.date.unwrap_or(date), state.staff.clone()));

        let still_current =
            matches!(&state.load, LoadState::Loading { date: d, staff: s } if *d == date && *s == staff);
        if !still_current {
            debug!(%date, %staff, "discarding availability answer for a superseded request");
            return reload;
        }
        if reload.is_some() {
            debug!(%date, %staff, "staff member changed during the load, reloading");
            self.set_load(&mut state, LoadState::Idle);
            return reload;
        }

        let next = match result {
            Ok(day) => {
                let slots = dedup_by_label(day.slots);
                debug!(%date, count = slots.len(), "slots loaded");
                LoadState::Loaded {
                    date,
                    staff,
                    slots,
                    message: day.message,
                }
            }
            Err(err) => {
                warn!(%date, %staff, error = %err, "availability request failed");
                LoadState::Failed {
                    date,
                    reason: FailureReason::Provider(err.to_string()),
                }
            }
        };
        self.set_load(&mut state, next);
        None
    }

    /// Selects `slot`, which must be one of the currently loaded slots.
    pub async fn select_slot(&self, slot: &TimeSlot) -> BookingResult<()> {
        let mut state = self.state.lock().await;
        let member = match &state.load {
            LoadState::Loaded { slots, .. } => slots.iter().find(|s| *s == slot).cloned(),
            _ => None,
        };
        let slot = member.ok_or_else(|| BookingError::InvalidSlotSelection(slot.label.clone()))?;
        self.set_selection(&mut state, Selection::Selected(slot));
        Ok(())
    }

    /// Selects the loaded slot whose display label is `label`.
    pub async fn select_label(&self, label: &str) -> BookingResult<()> {
        let slot = {
            let state = self.state.lock().await;
            state
                .load
                .slots()
                .iter()
                .find(|s| s.label == label.trim())
                .cloned()
                .ok_or_else(|| BookingError::InvalidSlotSelection(label.to_string()))?
        };
        self.select_slot(&slot).await
    }

    pub async fn clear_selection(&self) {
        let mut state = self.state.lock().await;
        self.clear_selection_locked(&mut state);
    }

    /// Builds the payload for the submission sink from the loaded date and
    /// staff member and the selected slot.
    ///
    /// The end time is the slot start plus the service duration and wraps
    /// past midnight without moving the date.
    pub async fn build_submission(&self) -> BookingResult<SubmissionPayload> {
        let state = self.state.lock().await;
        let (LoadState::Loaded { date, staff, .. }, Selection::Selected(slot)) =
            (&state.load, &state.selection)
        else {
            return Err(BookingError::IncompleteSelection);
        };

        let start_time = slot.start();
        Ok(SubmissionPayload {
            mode: self.context.mode.clone(),
            date: *date,
            staff: staff.clone(),
            service: self.context.service.clone(),
            start_time,
            end_time: time::add_minutes(start_time, self.context.duration_minutes),
            timezone: self.context.timezone.clone(),
            reason_for_rescheduling: self.context.reason_for_rescheduling.clone(),
        })
    }

    /// Builds the payload and hands it to `sink`. Nothing is retried.
    pub async fn submit(&self, sink: &dyn SubmissionSink) -> Result<SubmissionPayload, SubmissionError> {
        let payload = self.build_submission().await?;
        info!(
            date = %payload.date,
            start = %payload.start_time,
            reschedule = payload.is_reschedule(),
            "submitting booking"
        );
        sink.submit(&payload).await?;
        Ok(payload)
    }

    /// Refreshes the non-working days for `staff`. Without a staff member, or
    /// when the provider fails, the set is emptied.
    pub async fn load_non_working_days(&self, staff: Option<&StaffId>) {
        let days = match staff {
            None => BTreeSet::new(),
            Some(staff) => match self.providers.non_working_days.fetch(Some(staff)).await {
                Ok(days) => days,
                Err(err) => {
                    warn!(%staff, error = %err, "could not load non-working days");
                    BTreeSet::new()
                }
            },
        };

        let mut state = self.state.lock().await;
        if state.non_working_days != days {
            state.non_working_days = days.clone();
            self.emit(StateChange::NonWorkingDaysChanged(days));
        }
    }

    /// Handles a calendar click. Non-working days are rejected and `false`
    /// is returned; otherwise slots load for the current staff member.
    pub async fn pick_date(&self, date: DateKey) -> bool {
        let staff = {
            let state = self.state.lock().await;
            if state.non_working_days.contains(&date) {
                debug!(%date, "ignoring pick of a non-working day");
                self.emit(StateChange::DateRejected(date));
                return false;
            }
            state.staff.clone()
        };

        self.request_slots(date, staff).await;
        true
    }

    /// Handles a staff picker change: clears the selection, reloads the
    /// non-working days and then the slots for the current date (or `today`).
    ///
    /// A change made while slots are loading does not cancel that load, but
    /// its answer is discarded and the slots are reloaded for the new staff
    /// member, so a submission never pairs the new staff with old slots.
    pub async fn change_staff(&self, staff: Option<StaffId>, today: CalendarDate) {
        let date = {
            let mut state = self.state.lock().await;
            self.clear_selection_locked(&mut state);
            if state.staff != staff {
                state.staff = staff.clone();
                self.emit(StateChange::StaffChanged(staff.clone()));
            }
            if state.load.is_loading() {
                self.staff_reload.store(true, Ordering::SeqCst);
            }
            state.date.unwrap_or_else(|| date::canonical_key(today))
        };

        self.load_non_working_days(staff.as_ref()).await;
        self.request_slots(date, staff).await;
    }

    /// Asks for the staff member's next bookable date. Does nothing when no
    /// staff member is selected.
    pub async fn request_next_available(&self) {
        let Some(staff) = self.state.lock().await.staff.clone() else {
            return;
        };

        let answer = match self
            .providers
            .next_available
            .next_available(&staff, &self.context.service)
            .await
        {
            Ok(answer) => answer,
            Err(err) => {
                warn!(%staff, error = %err, "next available date lookup failed");
                NextAvailable::Unavailable(err.to_string())
            }
        };

        let mut state = self.state.lock().await;
        state.next_available = Some(answer.clone());
        self.emit(StateChange::NextAvailableChanged(answer));
    }

    /// True when the last load succeeded but produced no slots, which is when
    /// the page offers to look up the next available date.
    pub async fn offers_next_available(&self) -> bool {
        matches!(&self.state.lock().await.load, LoadState::Loaded { slots, .. } if slots.is_empty())
    }

    pub async fn is_non_working(&self, date: DateKey) -> bool {
        self.state.lock().await.non_working_days.contains(&date)
    }

    /// A date can be picked when it is neither a non-working day nor past.
    pub async fn is_selectable(&self, date: DateKey, today: CalendarDate) -> bool {
        !date::is_past(date, today) && !self.is_non_working(date).await
    }

    /// Loaded slots that do not overlap any of `existing`.
    pub async fn slots_clear_of(&self, existing: &[Interval]) -> Vec<TimeSlot> {
        let state = self.state.lock().await;
        state
            .load
            .slots()
            .iter()
            .filter(|slot| match overlap::first_conflict(&slot.interval, existing) {
                Some(conflict) => {
                    debug!(slot = %slot.label, %conflict, "slot conflicts with an existing booking");
                    false
                }
                None => true,
            })
            .cloned()
            .collect()
    }

    fn set_date(&self, state: &mut ControllerState, date: DateKey) {
        if state.date != Some(date) {
            state.date = Some(date);
            self.emit(StateChange::DateChanged(date));
        }
    }

    fn set_load(&self, state: &mut ControllerState, load: LoadState) {
        state.load = load.clone();
        self.emit(StateChange::LoadStateChanged(load));
    }

    fn set_selection(&self, state: &mut ControllerState, selection: Selection) {
        if state.selection != selection {
            state.selection = selection.clone();
            self.emit(StateChange::SelectionChanged(selection));
        }
    }

    fn clear_selection_locked(&self, state: &mut ControllerState) {
        self.set_selection(state, Selection::NoneSelected);
    }

    fn emit(&self, change: StateChange) {
        // No subscribers is fine; the state is still readable via snapshot().
        let _ = self.events.send(change);
    }
}

/// Drops repeated labels, keeping the first occurrence and the order.
fn dedup_by_label(slots: Vec<TimeSlot>) -> Vec<TimeSlot> {
    let mut seen = HashSet::new();
    slots
        .into_iter()
        .filter(|slot| seen.insert(slot.label.clone()))
        .collect()
}
