//! # Salonbook Core
//!
//! Booking widget logic with no presentation or transport attached:
//!
//! - [`time`]: time-of-day arithmetic and display formatting
//! - [`overlap`]: half-open interval conflict checks
//! - [`date`]: canonical date keys and locale display strings
//! - [`controller`]: the slot selection state machine
//! - [`providers`]: traits for the server-side collaborators
//!
//! Shells drive a [`controller::SlotSelectionController`], listen to its
//! [`controller::StateChange`] notifications and dispatch the payload it
//! builds to a [`providers::SubmissionSink`].

pub mod controller;
pub mod date;
pub mod errors;
pub mod models;
pub mod overlap;
pub mod providers;
pub mod time;
