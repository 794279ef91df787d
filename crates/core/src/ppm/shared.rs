//! Control loop state visible outside the loop task
//!
//! Everything here is a scalar atomic so the decode interrupt, the relay task
//! and the diagnostics query can touch it without a lock. Only load/store are
//! used, which keeps it usable on cores without compare-and-swap.

use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

use super::config::ControlMode;
use crate::watchdog::WatchdogShared;

#[derive(Debug)]
pub struct PpmShared {
    mode: AtomicU8,
    running: AtomicBool,
    stop_requested: AtomicBool,
    tick_paused: AtomicBool,
    level: AtomicU32,
}

impl Default for PpmShared {
    fn default() -> Self {
        Self::new()
    }
}

impl PpmShared {
    pub const fn new() -> Self {
        Self {
            mode: AtomicU8::new(ControlMode::None as u8),
            running: AtomicBool::new(false),
            stop_requested: AtomicBool::new(false),
            tick_paused: AtomicBool::new(false),
            level: AtomicU32::new(0),
        }
    }

    /// Decode event from the pulse decoder
    ///
    /// A valid sample feeds the watchdog unless the active mode issues no
    /// motor commands. Returns whether the watchdog was fed.
    pub fn on_pulse(&self, valid: bool, now_ms: u32, watchdog: &WatchdogShared) -> bool {
        if valid && self.mode().feeds_watchdog() {
            watchdog.reset(now_ms);
            true
        } else {
            false
        }
    }

    pub fn set_mode(&self, mode: ControlMode) {
        self.mode.store(mode as u8, Ordering::Release);
    }

    pub fn mode(&self) -> ControlMode {
        ControlMode::from_u8(self.mode.load(Ordering::Acquire))
    }

    pub fn publish_level(&self, level: f32) {
        self.level.store(level.to_bits(), Ordering::Relaxed);
    }

    /// Last decoded throttle level, before deadband
    pub fn decoded_level(&self) -> f32 {
        f32::from_bits(self.level.load(Ordering::Relaxed))
    }

    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
    }

    pub fn clear_stop(&self) {
        self.stop_requested.store(false, Ordering::Release);
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Suspend the periodic wake tick (relay switching)
    pub fn pause_tick(&self) {
        self.tick_paused.store(true, Ordering::Release);
    }

    pub fn resume_tick(&self) {
        self.tick_paused.store(false, Ordering::Release);
    }

    pub fn tick_paused(&self) -> bool {
        self.tick_paused.load(Ordering::Acquire)
    }
}
