//! Two-speed transmission relay
//!
//! Polled every [`POLL_PERIOD_MS`]: the relay engages once local speed rises
//! above the switch point and releases once it falls below it. A shift cuts
//! motor current and suspends the control loop's wake tick until the relay
//! has settled.

use crate::ppm::PpmShared;
use crate::traits::{MotorError, MotorInterface, RelayOutput};

/// Relay poll period (ms)
pub const POLL_PERIOD_MS: u64 = 250;

/// Time the relay needs to switch (ms)
pub const SETTLE_MS: u64 = 25;

/// Switch point when none is configured (erpm)
pub const DEFAULT_SWITCH_ERPM: f32 = 100_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shift {
    Engage,
    Disengage,
}

impl Shift {
    pub fn engaged(self) -> bool {
        self == Shift::Engage
    }

    pub fn name(self) -> &'static str {
        match self {
            Shift::Engage => "engage",
            Shift::Disengage => "disengage",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransmissionRelay {
    switch_erpm: f32,
    engaged: bool,
}

impl Default for TransmissionRelay {
    fn default() -> Self {
        Self::new(DEFAULT_SWITCH_ERPM)
    }
}

impl TransmissionRelay {
    pub const fn new(switch_erpm: f32) -> Self {
        Self {
            switch_erpm,
            engaged: false,
        }
    }

    pub fn configure(&mut self, switch_erpm: f32) {
        self.switch_erpm = switch_erpm;
    }

    pub fn switch_erpm(&self) -> f32 {
        self.switch_erpm
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged
    }

    /// Forget the engaged state
    pub fn stop(&mut self) {
        self.engaged = false;
    }

    /// Shift due at this speed, if any; records the new state
    pub fn poll(&mut self, rpm: f32) -> Option<Shift> {
        if rpm > self.switch_erpm && !self.engaged {
            self.engaged = true;
            Some(Shift::Engage)
        } else if rpm < self.switch_erpm && self.engaged {
            self.engaged = false;
            Some(Shift::Disengage)
        } else {
            None
        }
    }

    /// First half of a shift: pause the loop tick, cut current, drive the relay
    ///
    /// The caller waits [`SETTLE_MS`] and then calls [`Self::resume`]. The
    /// tick stays paused when the current cut fails.
    pub fn apply<M, R>(shift: Shift, shared: &PpmShared, motor: &M, relay: &R) -> Result<(), MotorError>
    where
        M: MotorInterface,
        R: RelayOutput,
    {
        shared.pause_tick();
        let cut = motor.set_current(0.0);
        relay.set_engaged(shift.engaged());
        cut
    }

    /// Second half of a shift: re-arm the loop tick
    pub fn resume(shared: &PpmShared) {
        shared.resume_tick();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{MockMotor, MockRelay, MotorCommand};

    #[test]
    fn engages_above_and_releases_below() {
        let mut relay = TransmissionRelay::new(10_000.0);
        assert_eq!(relay.poll(9_000.0), None);
        assert_eq!(relay.poll(10_500.0), Some(Shift::Engage));
        assert_eq!(relay.poll(12_000.0), None);
        assert!(relay.is_engaged());
        assert_eq!(relay.poll(9_999.0), Some(Shift::Disengage));
        assert!(!relay.is_engaged());
    }

    #[test]
    fn exact_switch_point_holds_state() {
        let mut relay = TransmissionRelay::new(10_000.0);
        assert_eq!(relay.poll(10_000.0), None);
        relay.poll(11_000.0);
        assert_eq!(relay.poll(10_000.0), None);
    }

    #[test]
    fn stop_clears_engaged() {
        let mut relay = TransmissionRelay::new(1_000.0);
        relay.poll(2_000.0);
        relay.stop();
        assert!(!relay.is_engaged());
        assert_eq!(relay.poll(2_000.0), Some(Shift::Engage));
    }

    #[test]
    fn default_switch_point_is_out_of_reach() {
        let mut relay = TransmissionRelay::default();
        assert_eq!(relay.poll(60_000.0), None);
    }

    #[test]
    fn shift_pauses_tick_and_cuts_current() {
        let shared = PpmShared::new();
        let motor = MockMotor::new();
        let relay = MockRelay::new();

        TransmissionRelay::apply(Shift::Engage, &shared, &motor, &relay).unwrap();
        assert!(shared.tick_paused());
        assert_eq!(motor.last_command(), Some(MotorCommand::Current(0.0)));
        assert!(relay.is_engaged());

        TransmissionRelay::resume(&shared);
        assert!(!shared.tick_paused());

        TransmissionRelay::apply(Shift::Disengage, &shared, &motor, &relay).unwrap();
        assert!(!relay.is_engaged());
        assert_eq!(relay.switch_count(), 2);
    }
}
