#![cfg_attr(not(test), no_std)]

//! pulse_drive_firmware - Embassy wiring for the PPM throttle application
//!
//! This crate runs the pure logic from `pulse_drive_core` as Embassy tasks:
//! the event-driven control loop, its wake tick, the command timeout
//! watchdog and the transmission relay.
//!
//! # Design Principles
//!
//! - **Embassy tasks**: One task per periodic activity, gated on `embassy`
//! - **Platform implementations**: `EmbassyTime`, `EmbassyState`
//! - **Drivers injected**: Motor, bus, decoder and relay arrive as `&'static dyn`
//!   references, so board support lives outside this crate

// Logging macros and trait implementations
pub mod core;

// Tasks and the start/stop/configure surface
pub mod app;

// Note: Logging macros (log_info!, log_warn!, log_error!, log_debug!, log_trace!)
// are exported at crate root via #[macro_export] in core::logging
