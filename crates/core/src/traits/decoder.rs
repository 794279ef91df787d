//! Pulse decoder collaborator
//!
//! Capture and median filtering happen in the decoder driver. It reports the
//! last pulse normalized over the configured window and, per decode event,
//! calls back into `PpmShared::on_pulse` with the validity of the sample.

use core::cell::Cell;

/// Pulse window handed to the decoder on (re)configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PulseWindow {
    /// Shortest accepted pulse (ms)
    pub start_ms: f32,
    /// Longest accepted pulse (ms)
    pub end_ms: f32,
    pub median_filter: bool,
}

/// Pulse decoder interface (platform-independent)
pub trait PulseDecoder {
    fn set_pulse_options(&self, window: PulseWindow);

    fn start(&self);

    fn stop(&self);

    /// Last pulse normalized over the window, -1.0 at `start_ms`, 1.0 at `end_ms`
    fn value(&self) -> f32;

    /// Timestamp (ms, wrapping) of the last valid decode
    fn last_update_ms(&self) -> u32;
}

impl<T: PulseDecoder + ?Sized> PulseDecoder for &T {
    fn set_pulse_options(&self, window: PulseWindow) {
        (**self).set_pulse_options(window)
    }
    fn start(&self) {
        (**self).start()
    }
    fn stop(&self) {
        (**self).stop()
    }
    fn value(&self) -> f32 {
        (**self).value()
    }
    fn last_update_ms(&self) -> u32 {
        (**self).last_update_ms()
    }
}

// ============================================================================
// Mock Implementation (always available for testing)
// ============================================================================

/// Mock decoder driven by the test
#[derive(Default)]
pub struct MockDecoder {
    window: Cell<Option<PulseWindow>>,
    running: Cell<bool>,
    value: Cell<f32>,
    last_update_ms: Cell<u32>,
}

impl MockDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a normalized sample captured at `now_ms`
    pub fn feed(&self, value: f32, now_ms: u32) {
        self.value.set(value);
        self.last_update_ms.set(now_ms);
    }

    /// Feed a pulse width (ms) against the configured window
    pub fn feed_pulse_ms(&self, pulse_ms: f32, now_ms: u32) {
        let window = self.window.get().unwrap_or(PulseWindow {
            start_ms: 1.0,
            end_ms: 2.0,
            median_filter: false,
        });
        let span = window.end_ms - window.start_ms;
        let normalized = (pulse_ms - window.start_ms) * 2.0 / span - 1.0;
        self.feed(normalized, now_ms);
    }

    pub fn window(&self) -> Option<PulseWindow> {
        self.window.get()
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }
}

impl PulseDecoder for MockDecoder {
    fn set_pulse_options(&self, window: PulseWindow) {
        self.window.set(Some(window));
    }

    fn start(&self) {
        self.running.set(true);
    }

    fn stop(&self) {
        self.running.set(false);
    }

    fn value(&self) -> f32 {
        self.value.get()
    }

    fn last_update_ms(&self) -> u32 {
        self.last_update_ms.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_pulse_normalizes_over_window() {
        let decoder = MockDecoder::new();
        decoder.set_pulse_options(PulseWindow {
            start_ms: 1.0,
            end_ms: 2.0,
            median_filter: true,
        });
        decoder.feed_pulse_ms(1.75, 40);
        assert!((decoder.value() - 0.5).abs() < 1e-6);
        assert_eq!(decoder.last_update_ms(), 40);
    }

    #[test]
    fn start_stop() {
        let decoder = MockDecoder::new();
        decoder.start();
        assert!(decoder.is_running());
        decoder.stop();
        assert!(!decoder.is_running());
    }
}
