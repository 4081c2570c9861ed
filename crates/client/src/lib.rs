//! # Salonbook Client
//!
//! HTTP adapter between the slot-selection controller and a salon's booking
//! server. [`HttpBookingClient`] implements every collaborator trait from
//! `salonbook-core`, so one instance can back a whole controller:
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use salonbook_client::{config::ClientConfig, HttpBookingClient};
//! use salonbook_core::controller::Providers;
//!
//! # fn run() -> eyre::Result<()> {
//! let client = Arc::new(HttpBookingClient::new(ClientConfig::from_env()?)?);
//! let providers = Providers::from_shared(client);
//! # Ok(())
//! # }
//! ```

/// Server address, encoding and endpoint settings
pub mod config;
/// Provider and sink implementations over `reqwest`
pub mod http;
mod wire;

pub use http::HttpBookingClient;
