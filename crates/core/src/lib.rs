//! pulse_drive_core - Pure no_std logic for the PPM throttle application
//!
//! This crate contains the platform-agnostic control loop, watchdog and
//! relay logic. Everything here can be tested on the host without any
//! feature flags or embassy dependencies.
//!
//! # Design Principles
//!
//! - **Zero cfg**: No `#[cfg(feature = ...)]` directives allowed
//! - **Pure no_std**: No std library dependencies
//! - **Trait abstractions**: Motor, bus, decoder, relay and time injected via traits
//!
//! # Modules
//!
//! - [`traits`]: Collaborator traits and their mocks
//! - [`ppm`]: Pulse interpretation, control modes, fleet coordination, control loop
//! - [`watchdog`]: Command timeout watchdog
//! - [`transmission`]: RPM-threshold relay
//! - [`parameters`]: Parameter store and parameter groups

#![no_std]

pub mod parameters;
pub mod ppm;
pub mod traits;
pub mod transmission;
pub mod watchdog;
