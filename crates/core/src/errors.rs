use thiserror::Error;

use crate::models::time_slot::TimeOfDay;

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("No staff member selected")]
    NoStaffSelected,

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Select a date and a time slot before submitting")]
    IncompleteSelection,

    #[error("Slot '{0}' is not among the loaded slots")]
    InvalidSlotSelection(String),

    #[error("Invalid interval: {start} is not before {end}")]
    InvalidInterval { start: TimeOfDay, end: TimeOfDay },

    #[error("Invalid time of day: {hour:02}:{minute:02}")]
    InvalidTime { hour: u32, minute: u32 },
}

impl BookingError {
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        BookingError::Parse(msg.into())
    }
}

pub type BookingResult<T> = Result<T, BookingError>;

/// Failures reported by the availability, non-working-day and next-available
/// collaborators.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The server answered but refused the query (`success: false` / `error: true`).
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// The server answered with something that is not a valid slot/date list.
    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Transport error: {0}")]
    Transport(#[from] eyre::Report),
}

#[derive(Error, Debug)]
pub enum SubmissionError {
    #[error("Submission is incomplete: {0}")]
    Incomplete(#[from] BookingError),

    #[error("Submission rejected: {0}")]
    Rejected(String),

    #[error("Transport error: {0}")]
    Transport(#[from] eyre::Report),
}
