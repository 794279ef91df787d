//! Firmware infrastructure
//!
//! Logging macros and the platform implementations of the core traits.

pub mod logging;
pub mod traits;
