//! Command timeout watchdog
//!
//! Runs on its own fixed period, independent of the control loop. When no
//! valid command arrived within the configured interval (or a fire request
//! was raised) it takes the motor away from whoever holds it and brings it
//! to a bounded-time stop:
//!
//! ```text
//! Armed ──(elapsed > interval | fire)──▶ Timed-out
//!   ▲                                        │
//!   └──────(reset before interval)───────────┘
//! ```
//!
//! The shared half ([`WatchdogShared`]) is plain atomics so the decode
//! interrupt, the control loop and the watchdog task can all reach it.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::ppm::math::{abs, sign, step_towards};
use crate::traits::{MotorError, MotorInterface};

/// Default command timeout (ms)
pub const DEFAULT_TIMEOUT_MS: u32 = 1000;

/// Watchdog task period (ms)
pub const TICK_PERIOD_MS: u64 = 10;

/// Initial and reload value of the stopped counter
pub const STOPPED_COUNTER_RELOAD: u32 = 1000;

/// Counter decrement per tick spent below [`STOPPED_RPM`]
pub const STOPPED_COUNTER_STEP: u32 = 10;

/// Speed (erpm) below which the motor counts as stopped
pub const STOPPED_RPM: f32 = 250.0;

/// Current step per tick while moving against the snapshot's sign (A)
pub const FAST_STEP: f32 = 0.5;

/// Current step per tick otherwise (A)
pub const SLOW_STEP: f32 = 0.2;

/// Watchdog state shared across tasks and interrupts
#[derive(Debug)]
pub struct WatchdogShared {
    last_reset_ms: AtomicU32,
    timeout_ms: AtomicU32,
    brake_current: AtomicU32,
    timed_out: AtomicBool,
    fire: AtomicBool,
}

impl Default for WatchdogShared {
    fn default() -> Self {
        Self::new()
    }
}

impl WatchdogShared {
    /// Boot state: timed out until the first reset
    pub const fn new() -> Self {
        Self {
            last_reset_ms: AtomicU32::new(0),
            timeout_ms: AtomicU32::new(DEFAULT_TIMEOUT_MS),
            brake_current: AtomicU32::new(0),
            timed_out: AtomicBool::new(true),
            fire: AtomicBool::new(false),
        }
    }

    /// Set the interval (0 disables) and the brake current target (A)
    ///
    /// Leaves the last-reset stamp alone: only a valid command re-arms.
    pub fn configure(&self, timeout_ms: u32, brake_current: f32) {
        self.timeout_ms.store(timeout_ms, Ordering::Relaxed);
        self.brake_current.store(brake_current.to_bits(), Ordering::Relaxed);
    }

    /// Register a valid command; also withdraws a pending fire request
    pub fn reset(&self, now_ms: u32) {
        self.last_reset_ms.store(now_ms, Ordering::Release);
        self.fire.store(false, Ordering::Release);
    }

    /// Request an immediate timeout on the next tick
    pub fn fire(&self) {
        self.fire.store(true, Ordering::Release);
    }

    pub fn fire_requested(&self) -> bool {
        self.fire.load(Ordering::Acquire)
    }

    pub fn has_timeout(&self) -> bool {
        self.timed_out.load(Ordering::Acquire)
    }

    pub fn brake_current(&self) -> f32 {
        f32::from_bits(self.brake_current.load(Ordering::Relaxed))
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms.load(Ordering::Relaxed)
    }

    pub fn last_reset_ms(&self) -> u32 {
        self.last_reset_ms.load(Ordering::Acquire)
    }

    /// Whether the interval elapsed or a fire request is pending
    pub fn expired(&self, now_ms: u32) -> bool {
        let timeout = self.timeout_ms();
        if timeout == 0 {
            return false;
        }
        now_ms.wrapping_sub(self.last_reset_ms()) > timeout || self.fire_requested()
    }

    fn set_timed_out(&self, timed_out: bool) {
        self.timed_out.store(timed_out, Ordering::Release);
    }
}

/// Outcome of one watchdog tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WatchdogTick {
    /// Commands are arriving in time
    Armed,
    /// Ramping the snapshot toward the brake target
    Ramping {
        /// First tick of this timeout
        entered: bool,
        /// Current after this tick's step (A, signed toward brake)
        current: f32,
    },
    /// Motor held at zero current, re-commanded every tick
    Stopped {
        /// The counter ran out on this tick
        reached: bool,
    },
}

/// Recovery state owned by the watchdog task
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeoutWatchdog {
    engaged: bool,
    current: f32,
    direction: f32,
    stopped_counter: u32,
}

impl Default for TimeoutWatchdog {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeoutWatchdog {
    /// Boot state: timed out with no snapshot, holding zero current
    pub const fn new() -> Self {
        Self {
            engaged: true,
            current: 0.0,
            direction: 1.0,
            stopped_counter: 0,
        }
    }

    pub fn stopped_counter(&self) -> u32 {
        self.stopped_counter
    }

    /// Run one watchdog period
    pub fn tick<M: MotorInterface>(
        &mut self,
        shared: &WatchdogShared,
        motor: &M,
        now_ms: u32,
    ) -> Result<WatchdogTick, MotorError> {
        if !shared.expired(now_ms) {
            self.engaged = false;
            shared.set_timed_out(false);
            return Ok(WatchdogTick::Armed);
        }

        motor.unlock();

        let entered = !self.engaged;
        if entered {
            self.engaged = true;
            self.current = motor.total_current();
            self.direction = sign(motor.total_current_directional());
            self.stopped_counter = STOPPED_COUNTER_RELOAD;
        }
        shared.set_timed_out(true);

        if self.stopped_counter == 0 {
            motor.set_current(0.0)?;
            return Ok(WatchdogTick::Stopped { reached: false });
        }

        if abs(motor.rpm()) < STOPPED_RPM {
            self.stopped_counter = self.stopped_counter.saturating_sub(STOPPED_COUNTER_STEP);
        } else {
            self.stopped_counter = STOPPED_COUNTER_RELOAD;
        }

        if self.stopped_counter == 0 {
            motor.set_current(0.0)?;
            return Ok(WatchdogTick::Stopped { reached: true });
        }

        let goal = -shared.brake_current();
        let against = (self.current < 0.0 && goal > self.current)
            || (self.current > 0.0 && goal < self.current);
        let step = if against { FAST_STEP } else { SLOW_STEP };
        step_towards(&mut self.current, goal, step);

        if self.current > 0.0 {
            motor.set_current(self.direction * self.current)?;
        } else {
            motor.set_brake_current(abs(self.current))?;
        }

        Ok(WatchdogTick::Ramping {
            entered,
            current: self.current,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{MockMotor, MotorCommand};

    const EPS: f32 = 1e-4;

    fn expired_shared(brake: f32) -> WatchdogShared {
        let shared = WatchdogShared::new();
        shared.configure(100, brake);
        shared
    }

    /// Watchdog that has seen one command at t=0
    fn armed(shared: &WatchdogShared, motor: &MockMotor) -> TimeoutWatchdog {
        let mut watchdog = TimeoutWatchdog::new();
        shared.reset(0);
        assert_eq!(watchdog.tick(shared, motor, 0).unwrap(), WatchdogTick::Armed);
        watchdog
    }

    #[test]
    fn boots_timed_out() {
        let shared = WatchdogShared::new();
        assert!(shared.has_timeout());
        assert_eq!(shared.timeout_ms(), DEFAULT_TIMEOUT_MS);
    }

    #[test]
    fn fresh_reset_arms() {
        let shared = expired_shared(0.0);
        let motor = MockMotor::new();
        let mut watchdog = TimeoutWatchdog::new();
        shared.reset(50);
        assert_eq!(watchdog.tick(&shared, &motor, 100).unwrap(), WatchdogTick::Armed);
        assert!(!shared.has_timeout());
        assert_eq!(motor.command_count(), 0);
    }

    #[test]
    fn zero_interval_disables() {
        let shared = WatchdogShared::new();
        shared.configure(0, 10.0);
        let motor = MockMotor::new();
        let mut watchdog = TimeoutWatchdog::new();
        assert_eq!(
            watchdog.tick(&shared, &motor, 1_000_000).unwrap(),
            WatchdogTick::Armed
        );
    }

    #[test]
    fn fire_request_times_out_immediately() {
        let shared = expired_shared(0.0);
        let motor = MockMotor::new();
        motor.lock();
        let mut watchdog = armed(&shared, &motor);
        shared.fire();
        let tick = watchdog.tick(&shared, &motor, 1).unwrap();
        assert!(matches!(tick, WatchdogTick::Ramping { entered: true, .. }));
        assert!(shared.has_timeout());
        assert!(!motor.is_locked());
    }

    #[test]
    fn stops_within_hundred_ticks_when_slow() {
        let shared = expired_shared(20.0);
        let motor = MockMotor::new();
        motor.set_total_current(30.0);
        motor.set_rpm(100.0);
        let mut watchdog = armed(&shared, &motor);

        let mut now = 200;
        let mut ticks = 0;
        loop {
            now += 10;
            ticks += 1;
            if let WatchdogTick::Stopped { reached } = watchdog.tick(&shared, &motor, now).unwrap() {
                assert!(reached);
                break;
            }
        }
        assert!(ticks <= 100);
        assert_eq!(motor.last_command(), Some(MotorCommand::Current(0.0)));
        assert_eq!(
            watchdog.tick(&shared, &motor, now + 10).unwrap(),
            WatchdogTick::Stopped { reached: false }
        );
    }

    #[test]
    fn fast_motor_keeps_ramping() {
        let shared = expired_shared(5.0);
        let motor = MockMotor::new();
        motor.set_rpm(5000.0);
        let mut watchdog = armed(&shared, &motor);
        for i in 0..200 {
            watchdog.tick(&shared, &motor, 200 + i * 10).unwrap();
        }
        assert_eq!(watchdog.stopped_counter(), STOPPED_COUNTER_RELOAD);
        assert!(matches!(motor.last_command(), Some(MotorCommand::Brake(b)) if (b - 5.0).abs() < EPS));
    }

    #[test]
    fn ramp_approaches_brake_target_monotonically() {
        let shared = expired_shared(4.0);
        let motor = MockMotor::new();
        motor.set_total_current(10.0);
        motor.set_rpm(3000.0);
        let mut watchdog = armed(&shared, &motor);

        let goal = -4.0;
        let mut previous = (10.0f32 - goal).abs();
        for i in 0..100 {
            match watchdog.tick(&shared, &motor, 200 + i * 10).unwrap() {
                WatchdogTick::Ramping { current, .. } => {
                    let distance = (current - goal).abs();
                    assert!(distance <= previous + EPS);
                    assert!(current >= goal - EPS);
                    previous = distance;
                }
                other => panic!("unexpected {:?}", other),
            }
        }
        assert!(previous < EPS);
    }

    #[test]
    fn driving_current_keeps_rotation_sign() {
        let shared = expired_shared(0.0);
        let motor = MockMotor::new();
        motor.set_rpm(-3000.0);
        motor.set_total_current(10.0);
        let mut watchdog = armed(&shared, &motor);
        watchdog.tick(&shared, &motor, 500).unwrap();
        match motor.last_command() {
            Some(MotorCommand::Current(amps)) => assert!((amps + 9.5).abs() < EPS),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn rearms_after_reset() {
        let shared = expired_shared(0.0);
        let motor = MockMotor::new();
        let mut watchdog = armed(&shared, &motor);
        watchdog.tick(&shared, &motor, 500).unwrap();
        shared.reset(505);
        assert_eq!(watchdog.tick(&shared, &motor, 510).unwrap(), WatchdogTick::Armed);
        let tick = watchdog.tick(&shared, &motor, 700).unwrap();
        assert!(matches!(tick, WatchdogTick::Ramping { entered: true, .. }));
    }

    #[test]
    fn boot_holds_zero_current_without_ramping() {
        let shared = expired_shared(5.0);
        let motor = MockMotor::new();
        motor.set_total_current(20.0);
        motor.set_rpm(4000.0);
        let mut watchdog = TimeoutWatchdog::new();
        assert_eq!(
            watchdog.tick(&shared, &motor, 500).unwrap(),
            WatchdogTick::Stopped { reached: false }
        );
        assert_eq!(motor.last_command(), Some(MotorCommand::Current(0.0)));
        assert!(shared.has_timeout());
    }

    #[test]
    fn reconfigure_does_not_rearm_silent_watchdog() {
        let shared = expired_shared(2.0);
        let motor = MockMotor::new();
        motor.set_rpm(3000.0);
        let mut watchdog = armed(&shared, &motor);
        let tick = watchdog.tick(&shared, &motor, 500).unwrap();
        assert!(matches!(tick, WatchdogTick::Ramping { entered: true, .. }));

        shared.configure(100, 2.0);
        let tick = watchdog.tick(&shared, &motor, 520).unwrap();
        assert!(matches!(tick, WatchdogTick::Ramping { entered: false, .. }));
        assert!(shared.has_timeout());
    }

    #[test]
    fn stopped_motor_is_held_at_zero_against_other_writers() {
        let shared = expired_shared(0.0);
        let motor = MockMotor::new();
        motor.set_rpm(0.0);
        let mut watchdog = armed(&shared, &motor);
        let mut now = 200;
        while watchdog.tick(&shared, &motor, now).unwrap() != (WatchdogTick::Stopped { reached: true }) {
            now += 10;
        }

        motor.set_current(30.0).unwrap();
        now += 10;
        assert_eq!(
            watchdog.tick(&shared, &motor, now).unwrap(),
            WatchdogTick::Stopped { reached: false }
        );
        assert_eq!(motor.last_command(), Some(MotorCommand::Current(0.0)));
    }
}
