//! Terminal rendering of the slot-selection controller.
//!
//! The shell drives the controller the way the booking page does (pick a
//! staff member, pick a date, pick a slot) and prints every state change it
//! is notified of.

use std::sync::Arc;

use color_eyre::eyre::{eyre, Result};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::debug;

use salonbook_client::config::ClientConfig;
use salonbook_client::HttpBookingClient;
use salonbook_core::controller::{
    FailureReason, LoadState, Providers, Selection, SlotSelectionController, StateChange,
};
use salonbook_core::date::{self, DateKey, LocaleTag};
use salonbook_core::models::booking::{BookingContext, ServiceId, StaffId};
use salonbook_core::models::time_slot::TimeSlot;
use salonbook_core::providers::{NextAvailable, NonWorkingDaysProvider};
use salonbook_core::time;

use crate::cli::{Command, SlotArgs};

pub async fn run(command: Command, config: ClientConfig) -> Result<()> {
    let locale = config.locale;
    let client = Arc::new(HttpBookingClient::new(config)?);

    match command {
        Command::Slots(args) => {
            let context = context_for(&client, &args);
            let controller = controller_for(&client, context, &args.staff);
            let printer = print_changes(&controller, locale);

            load_day(&client, &controller, args.date).await;
            let state = controller.snapshot().await;
            let duration = controller.context().duration_minutes;
            finish(controller, printer).await?;

            print_slots(&state.load, duration, locale);
            Ok(())
        }
        Command::Days { staff } => {
            let Some(staff) = StaffId::from_picker(&staff) else {
                println!("No staff member selected");
                return Ok(());
            };
            let days = client.fetch(Some(&staff)).await?;
            if days.is_empty() {
                println!("{staff} works every day");
            }
            for day in days {
                println!("{}", date::display_medium(day, locale));
            }
            Ok(())
        }
        Command::Next { staff, service } => {
            let context = BookingContext::new(ServiceId::new(service), 0, client.config().timezone_name());
            let controller = controller_for(&client, context, &staff);
            let printer = print_changes(&controller, locale);

            controller.request_next_available().await;
            let state = controller.snapshot().await;
            finish(controller, printer).await?;

            if state.staff.is_none() {
                println!("Select a staff member to look up availability");
            }
            Ok(())
        }
        Command::Book {
            slots: args,
            slot,
            reschedule,
            original_date,
            reason,
        } => {
            let mut context = context_for(&client, &args);
            if let Some(id) = reschedule {
                context = context.rescheduling(id, original_date, reason);
            }
            let controller = controller_for(&client, context, &args.staff);
            let printer = print_changes(&controller, locale);

            load_day(&client, &controller, args.date).await;
            controller.select_label(&slot).await?;
            let payload = controller.submit(client.as_ref()).await?;
            finish(controller, printer).await?;

            let what = if payload.is_reschedule() {
                "Reschedule request"
            } else {
                "Appointment request"
            };
            println!(
                "{what} sent for {} at {}",
                date::display_long(payload.date, locale),
                time::format_display(payload.start_time)
            );
            Ok(())
        }
    }
}

fn context_for(client: &HttpBookingClient, args: &SlotArgs) -> BookingContext {
    BookingContext::new(
        ServiceId::new(args.service.clone()),
        args.duration,
        client.config().timezone_name(),
    )
}

fn controller_for(
    client: &Arc<HttpBookingClient>,
    context: BookingContext,
    staff: &str,
) -> SlotSelectionController {
    SlotSelectionController::new(context, Providers::from_shared(client.clone()))
        .with_staff(StaffId::from_picker(staff))
}

/// Loads non-working days, then slots for `date` or the reschedule date or
/// today, and offers the next available date when the day is empty.
async fn load_day(
    client: &HttpBookingClient,
    controller: &SlotSelectionController,
    date: Option<DateKey>,
) {
    let today = date::today_in(client.config().timezone);
    match date {
        Some(date) => {
            let staff = controller.snapshot().await.staff;
            controller.load_non_working_days(staff.as_ref()).await;
            controller.pick_date(date).await;
        }
        None => controller.start(today).await,
    }

    if controller.offers_next_available().await {
        controller.request_next_available().await;
    }
}

fn print_slots(load: &LoadState, duration: i64, locale: LocaleTag) {
    let LoadState::Loaded { date, slots, .. } = load else {
        return;
    };
    if slots.is_empty() {
        return;
    }

    println!(
        "{} ({} each):",
        date::display_long(*date, locale),
        time::format_duration(duration)
    );
    for slot in slots {
        println!("  {}", slot_line(slot));
    }
}

fn slot_line(slot: &TimeSlot) -> String {
    format!(
        "{:>8}  {} - {}",
        slot.label,
        time::format_display(slot.start()),
        time::format_display(slot.end())
    )
}

fn print_changes(controller: &SlotSelectionController, locale: LocaleTag) -> JoinHandle<()> {
    let mut changes = controller.subscribe();
    tokio::spawn(async move {
        loop {
            match changes.recv().await {
                Ok(change) => {
                    if let Some(line) = describe(&change, locale) {
                        println!("{line}");
                    }
                }
                Err(RecvError::Lagged(missed)) => debug!(missed, "shell fell behind on state changes"),
                Err(RecvError::Closed) => break,
            }
        }
    })
}

/// Drops the controller so the printer sees the channel close, then waits
/// for it to flush.
async fn finish(controller: SlotSelectionController, printer: JoinHandle<()>) -> Result<()> {
    drop(controller);
    printer.await.map_err(|e| eyre!("state change printer failed: {e}"))
}

fn describe(change: &StateChange, locale: LocaleTag) -> Option<String> {
    let line = match change {
        StateChange::DateChanged(date) => format!("Date: {}", date::display_long(*date, locale)),
        StateChange::StaffChanged(Some(staff)) => format!("Staff member: {staff}"),
        StateChange::StaffChanged(None) => "No staff member selected".to_string(),
        StateChange::LoadStateChanged(LoadState::Idle) => return None,
        StateChange::LoadStateChanged(LoadState::Loading { date, .. }) => {
            format!("Loading available slots for {}...", date::display_medium(*date, locale))
        }
        StateChange::LoadStateChanged(LoadState::Loaded { slots, message, .. }) if slots.is_empty() => message
            .clone()
            .unwrap_or_else(|| "No available slots for this day".to_string()),
        StateChange::LoadStateChanged(LoadState::Loaded { slots, .. }) => {
            format!("{} slots available", slots.len())
        }
        StateChange::LoadStateChanged(LoadState::Failed { reason, .. }) => match reason {
            FailureReason::NoStaffSelected => "Select a staff member to see available slots".to_string(),
            FailureReason::Provider(message) => format!("Could not load slots: {message}"),
        },
        StateChange::SelectionChanged(Selection::Selected(slot)) => format!(
            "Selected {} to {}",
            time::format_display(slot.start()),
            time::format_display(slot.end())
        ),
        StateChange::SelectionChanged(Selection::NoneSelected) => return None,
        StateChange::NonWorkingDaysChanged(days) if days.is_empty() => return None,
        StateChange::NonWorkingDaysChanged(days) => format!("{} non-working days", days.len()),
        StateChange::NextAvailableChanged(NextAvailable::Found(date)) => {
            format!("Next available date: {}", date::display_long(*date, locale))
        }
        StateChange::NextAvailableChanged(NextAvailable::Unavailable(message)) => message.clone(),
        StateChange::DateRejected(date) => {
            format!("{} is not a working day", date::display_long(*date, locale))
        }
    };
    Some(line)
}
