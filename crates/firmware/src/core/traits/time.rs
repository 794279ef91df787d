//! Embassy time source
//!
//! The `TimeSource` trait and `MockTime` live in the core crate; this adds
//! the implementation backed by the Embassy time driver.

pub use pulse_drive_core::traits::{MockTime, TimeSource};

/// Time source reading `embassy_time::Instant`.
#[cfg(feature = "embassy")]
#[derive(Clone, Copy, Default)]
pub struct EmbassyTime;

#[cfg(feature = "embassy")]
impl TimeSource for EmbassyTime {
    fn now_ms(&self) -> u64 {
        embassy_time::Instant::now().as_millis()
    }

    fn now_us(&self) -> u64 {
        embassy_time::Instant::now().as_micros()
    }
}
