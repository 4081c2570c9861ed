use clap::{Args, Parser, Subcommand};
use salonbook_core::date::DateKey;

/// Look up salon availability and book appointments from the terminal.
///
/// Server settings come from `BOOKING_*` environment variables or a `.env`
/// file.
#[derive(Debug, Parser)]
#[command(name = "salonbook", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the bookable slots for a staff member on a date
    Slots(SlotArgs),
    /// Print a staff member's non-working days
    Days {
        /// Staff member id, or `none`
        #[arg(long)]
        staff: String,
    },
    /// Print the next date with free slots
    Next {
        #[arg(long)]
        staff: String,
        #[arg(long)]
        service: String,
    },
    /// Select a slot and submit an appointment or reschedule request
    Book {
        #[command(flatten)]
        slots: SlotArgs,
        /// Slot label as the server lists it, e.g. `9:00 AM` or `14:30`
        #[arg(long)]
        slot: String,
        /// Appointment request to move instead of booking a new one
        #[arg(long)]
        reschedule: Option<String>,
        /// Date of the appointment being moved
        #[arg(long, requires = "reschedule")]
        original_date: Option<DateKey>,
        #[arg(long, requires = "reschedule")]
        reason: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct SlotArgs {
    /// Day to query as YYYY-MM-DD (default: today in the salon timezone)
    #[arg(long)]
    pub date: Option<DateKey>,
    /// Staff member id, or `none`
    #[arg(long)]
    pub staff: String,
    #[arg(long)]
    pub service: String,
    /// Service duration in minutes
    #[arg(long, default_value_t = 30)]
    pub duration: i64,
}
