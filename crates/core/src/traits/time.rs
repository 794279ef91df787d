//! Time abstraction for the control loop and watchdog.
//!
//! The loop and the watchdog compare timestamps produced by different
//! contexts (decode interrupt, periodic tick, watchdog task). All of them read
//! the same `TimeSource` so that ages are computed against one clock.

use core::cell::Cell;

/// Platform-agnostic monotonic clock.
///
/// - `EmbassyTime` (firmware crate) on target
/// - [`MockTime`] for host tests with controllable time
///
/// # Example
///
/// ```
/// use pulse_drive_core::traits::{MockTime, TimeSource};
///
/// let time = MockTime::new();
/// let stamp = time.now_ms32();
/// time.advance_ms(25);
/// assert_eq!(time.age_ms(stamp), 25);
/// ```
pub trait TimeSource: Clone + Send + Sync {
    /// Returns current time in milliseconds since system start.
    fn now_ms(&self) -> u64;

    /// Returns current time in microseconds since system start.
    fn now_us(&self) -> u64;

    /// Returns elapsed time in microseconds since a reference point.
    ///
    /// Uses saturating subtraction to handle potential overflow.
    fn elapsed_since(&self, reference_us: u64) -> u64 {
        self.now_us().saturating_sub(reference_us)
    }

    /// Millisecond timestamp truncated to 32 bits.
    ///
    /// This is the representation stored in atomics shared with interrupt
    /// context; compare such stamps with [`TimeSource::age_ms`] only.
    fn now_ms32(&self) -> u32 {
        self.now_ms() as u32
    }

    /// Age of a 32-bit millisecond stamp, wrap-safe.
    fn age_ms(&self, stamp_ms: u32) -> u32 {
        self.now_ms32().wrapping_sub(stamp_ms)
    }
}

// ============================================================================
// Mock Implementation (always available for testing)
// ============================================================================

/// Mock time source with manual advancement.
#[derive(Clone, Default)]
pub struct MockTime {
    current_us: Cell<u64>,
}

// Safety: MockTime is only used in single-threaded test contexts.
unsafe impl Send for MockTime {}
unsafe impl Sync for MockTime {}

impl MockTime {
    /// Creates a new `MockTime` starting at time 0.
    pub fn new() -> Self {
        Self {
            current_us: Cell::new(0),
        }
    }

    /// Creates a new `MockTime` starting at the specified time.
    pub fn with_initial(us: u64) -> Self {
        Self {
            current_us: Cell::new(us),
        }
    }

    /// Sets the current time to an absolute value.
    pub fn set(&self, us: u64) {
        self.current_us.set(us);
    }

    /// Advances the current time by the specified amount.
    pub fn advance(&self, us: u64) {
        self.current_us.set(self.current_us.get() + us);
    }

    /// Advances the current time by whole milliseconds.
    pub fn advance_ms(&self, ms: u64) {
        self.advance(ms * 1000);
    }
}

impl TimeSource for MockTime {
    fn now_ms(&self) -> u64 {
        self.current_us.get() / 1000
    }

    fn now_us(&self) -> u64 {
        self.current_us.get()
    }
}

impl<T: TimeSource> TimeSource for &T {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }

    fn now_us(&self) -> u64 {
        (**self).now_us()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_time_advance_ms() {
        let time = MockTime::new();
        time.advance_ms(3);
        assert_eq!(time.now_us(), 3_000);
        assert_eq!(time.now_ms(), 3);
    }

    #[test]
    fn mock_time_elapsed_since_saturates() {
        let time = MockTime::with_initial(1_000);
        assert_eq!(time.elapsed_since(5_000), 0);
        assert_eq!(time.elapsed_since(400), 600);
    }

    #[test]
    fn age_ms_survives_u32_wrap() {
        let time = MockTime::with_initial((u32::MAX as u64 - 4) * 1000);
        let stamp = time.now_ms32();
        time.advance_ms(10);
        assert!(time.now_ms32() < stamp);
        assert_eq!(time.age_ms(stamp), 10);
    }

    #[test]
    fn reference_forwards_to_inner_clock() {
        let time = MockTime::with_initial(7_000);
        let by_ref = &time;
        assert_eq!(by_ref.now_ms(), 7);
        time.advance_ms(1);
        assert_eq!(by_ref.now_ms(), 8);
    }
}
