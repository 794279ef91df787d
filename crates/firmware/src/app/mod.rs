//! PPM application runtime
//!
//! ```text
//!  decode IRQ ──on_pulse_decoded──┐
//!                                 ▼
//!  tick_task (1-2 ms) ──────▶ PPM_WAKE ──▶ ppm_task ──▶ motor / peers
//!                                              ▲
//!  configure() ──▶ PPM_CONFIG mailbox ─────────┘
//!
//!  watchdog_task (10 ms) ──▶ motor      transmission_task (250 ms) ──▶ relay
//! ```
//!
//! Everything except the mailbox needs the `embassy` feature.

pub mod mailbox;

#[cfg(feature = "embassy")]
pub mod service;
#[cfg(feature = "embassy")]
pub mod tasks;

#[cfg(feature = "embassy")]
pub use service::{
    apply_parameters, configure, configure_timeout, decoded_level, install, on_pulse_decoded, start,
    start_transmission, start_watchdog, stop, stop_transmission, AppError, Drivers,
};
