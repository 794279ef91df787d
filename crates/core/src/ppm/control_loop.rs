//! PPM control loop
//!
//! One [`PpmLoop::step`] per wake event:
//!
//! 1. read and interpret the decoder, publish the decoded level
//! 2. secondary channel: publish cruise status and stop there
//! 3. signal lost: fire the watchdog once, track the motor, skip dispatch
//! 4. motor fault: reset bookkeeping, skip dispatch
//! 5. throttle curve, ramp, fleet snapshot, mode engine
//! 6. safe-start gate, then dispatch to the local motor and fresh peers
//!
//! The loop owns its collaborators; the firmware hands in `&'static`
//! references so the same drivers stay reachable from other tasks.

use super::config::{ControlMode, CruiseStatus, PpmConfig};
use super::cruise::secondary_channel_status;
use super::engine::{Command, Decision, Engine, EngineInput};
use super::fleet::{fresh_peers, FleetSnapshot};
use super::pulse::{interpret, throttle_curve};
use super::ramp::RampState;
use super::shared::PpmShared;
use super::traction::traction_scale;
use crate::traits::{
    FaultCode, MotorError, MotorInterface, MotorLimits, PeerBus, PulseDecoder, PulseWindow,
    TimeSource,
};
use crate::watchdog::WatchdogShared;

/// Nominal wake period while the loop drives the motor (ms)
pub const TICK_PERIOD_MS: u64 = 1;

/// Wake period in secondary-channel mode (ms)
pub const SECONDARY_PERIOD_MS: u64 = 2;

/// Periodic wake interval for `mode` (ms)
pub fn wake_period_ms(mode: ControlMode) -> u64 {
    if mode == ControlMode::CruiseSecondaryChannel {
        SECONDARY_PERIOD_MS
    } else {
        TICK_PERIOD_MS
    }
}

/// Outcome of one loop cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cycle {
    /// Stop was requested, the task should exit
    Stopped,
    /// Nothing to do in the configured mode
    Idle,
    /// Secondary channel published this cruise status
    CruiseChannel(CruiseStatus),
    /// Command stream lost; `edge` on the first cycle of the loss
    TimedOut { edge: bool },
    /// Motor driver reports a fault, dispatch skipped
    Fault(FaultCode),
    /// Safe-start gate closed, brake current applied
    SafeStartHold,
    Dispatched(Command),
}

impl Cycle {
    pub fn name(&self) -> &'static str {
        match self {
            Cycle::Stopped => "stopped",
            Cycle::Idle => "idle",
            Cycle::CruiseChannel(_) => "cruise channel",
            Cycle::TimedOut { .. } => "timed out",
            Cycle::Fault(_) => "fault",
            Cycle::SafeStartHold => "safe-start hold",
            Cycle::Dispatched(_) => "dispatched",
        }
    }
}

fn pulse_window(config: &PpmConfig) -> PulseWindow {
    PulseWindow {
        start_ms: config.pulse_start,
        end_ms: config.pulse_end,
        median_filter: config.median_filter,
    }
}

pub struct PpmLoop<M, B, D, T> {
    motor: M,
    bus: B,
    decoder: D,
    time: T,
    config: PpmConfig,
    engine: Engine,
    ramp: RampState,
}

impl<M, B, D, T> PpmLoop<M, B, D, T>
where
    M: MotorInterface,
    B: PeerBus,
    D: PulseDecoder,
    T: TimeSource,
{
    pub fn new(motor: M, bus: B, decoder: D, time: T, config: PpmConfig) -> Self {
        let now = time.now_ms32();
        Self {
            engine: Engine::new(&config),
            ramp: RampState::new(now),
            motor,
            bus,
            decoder,
            time,
            config,
        }
    }

    pub fn config(&self) -> &PpmConfig {
        &self.config
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn ramp(&self) -> &RampState {
        &self.ramp
    }

    /// Swap in a new configuration at a cycle boundary
    ///
    /// Rebuilds all per-mode state and clears the published cruise status.
    pub fn configure(&mut self, config: PpmConfig, shared: &PpmShared) {
        self.engine = Engine::new(&config);
        shared.set_mode(config.mode);
        self.motor.set_cruise_status(CruiseStatus::Inactive);
        if shared.is_running() {
            self.decoder.set_pulse_options(pulse_window(&config));
        }
        self.config = config;
    }

    /// Prepare a fresh run and start the decoder
    pub fn start(&mut self, shared: &PpmShared) {
        shared.clear_stop();
        shared.set_mode(self.config.mode);
        self.engine = Engine::new(&self.config);
        self.ramp = RampState::new(self.time.now_ms32());
        self.decoder.set_pulse_options(pulse_window(&self.config));
        self.decoder.start();
        shared.set_running(true);
    }

    /// Wake period the firmware tick should use for the current mode
    pub fn tick_period_ms(&self) -> u64 {
        wake_period_ms(self.config.mode)
    }

    /// Run one cycle
    pub fn step(&mut self, shared: &PpmShared, watchdog: &WatchdogShared) -> Result<Cycle, MotorError> {
        if shared.stop_requested() {
            shared.set_running(false);
            return Ok(Cycle::Stopped);
        }

        let config = &self.config;
        if config.mode == ControlMode::None {
            return Ok(Cycle::Idle);
        }

        let now = self.time.now_ms32();
        let interpreted = interpret(config, self.decoder.value());
        shared.publish_level(interpreted.level);

        if config.mode == ControlMode::CruiseSecondaryChannel {
            let status = secondary_channel_status(interpreted.deadbanded, config);
            self.motor.set_cruise_status(status);
            return Ok(Cycle::CruiseChannel(status));
        }

        let limits = self.motor.limits();
        let timeout_ms = watchdog.timeout_ms();
        let stale = timeout_ms != 0 && self.time.age_ms(self.decoder.last_update_ms()) > timeout_ms;
        if watchdog.has_timeout() || stale {
            let edge = self.ramp.enter_timeout();
            if edge {
                watchdog.fire();
                if config.multi_esc {
                    for peer in fresh_peers(&self.bus, now).iter() {
                        let _ = self.bus.notify_timeout(peer.id);
                    }
                }
            }
            self.ramp.track_motor(
                self.motor.total_current(),
                self.motor.total_current_directional(),
                &limits,
                now,
            );
            return Ok(Cycle::TimedOut { edge });
        }

        if let Some(fault) = self.motor.fault() {
            self.engine.clear_idle_count();
            self.ramp.reset(now);
            return Ok(Cycle::Fault(fault));
        }

        let curved = throttle_curve(
            interpreted.deadbanded,
            config.throttle_exp,
            config.throttle_exp_brake,
            config.throttle_exp_mode,
        );
        let ramped = self.ramp.apply(curved, config, &limits, now);

        let fleet = FleetSnapshot::collect(
            self.motor.rpm(),
            self.motor.cruise_status(),
            &self.bus,
            config.multi_esc,
            now,
        );

        let input = EngineInput {
            authority: ramped.authority,
            fleet: &fleet,
            limits: &limits,
            passed_ms: ramped.passed_ms,
        };
        let decision = match self.engine.compute(config, input) {
            Some(decision) => decision,
            None => return Ok(Cycle::Idle),
        };

        if !self.engine.gate_open(config.safe_start) {
            self.motor.set_brake_current(watchdog.brake_current())?;
            return Ok(Cycle::SafeStartHold);
        }

        self.dispatch(decision, &fleet, &limits)?;
        Ok(Cycle::Dispatched(decision.command))
    }

    fn dispatch(&mut self, decision: Decision, fleet: &FleetSnapshot, limits: &MotorLimits) -> Result<(), MotorError> {
        let multi = self.config.multi_esc;

        match decision.command {
            Command::Duty(duty) => {
                self.motor.set_duty(duty)?;
                if multi {
                    self.share_filtered_current(fleet);
                }
            }
            Command::Speed(erpm) => {
                self.motor.set_speed(erpm)?;
                if multi {
                    self.share_filtered_current(fleet);
                }
            }
            Command::HoldSpeed { erpm, offset, cruise } => {
                match cruise {
                    Some(status) => self.motor.set_speed_with_cruise(erpm, status)?,
                    None => self.motor.set_speed(erpm)?,
                }
                if multi {
                    for peer in fleet.peers() {
                        let _ = self.bus.send_rpm(peer.id, peer.rpm + offset, fleet.cruise);
                    }
                }
            }
            Command::Brake(amps) => {
                self.engine.clear_speed_target();
                self.motor.set_brake_current(amps)?;
                if multi {
                    let rel = super::math::abs(decision.authority);
                    for peer in fleet.peers() {
                        let _ = self.bus.send_current_brake_rel(peer.id, rel);
                    }
                }
            }
            Command::Current(amps) => {
                self.engine.clear_speed_target();
                self.drive_current(amps, decision.authority, fleet, limits)?;
            }
        }
        Ok(())
    }

    /// Driving current with traction control, computed in the forward frame
    fn drive_current(
        &mut self,
        amps: f32,
        authority: f32,
        fleet: &FleetSnapshot,
        limits: &MotorLimits,
    ) -> Result<(), MotorError> {
        let flip = if amps < 0.0 { -1.0 } else { 1.0 };
        let current = amps * flip;
        let authority = authority * flip;
        let rpm_lowest = fleet.rpm_lowest * flip;
        let tc = self.config.traction;

        let mut out = current;
        if self.config.multi_esc {
            for peer in fleet.peers() {
                let rel = if tc.enabled {
                    traction_scale(authority, peer.rpm * flip, rpm_lowest, &tc)
                } else {
                    authority
                };
                let _ = self.bus.send_current_rel(peer.id, rel * flip);
            }

            if tc.enabled {
                out = traction_scale(current, fleet.rpm_local * flip, rpm_lowest, &tc);
                if out < limits.min_current {
                    out = 0.0;
                }
            }
        }

        self.motor.set_current(out * flip)
    }

    fn share_filtered_current(&self, fleet: &FleetSnapshot) {
        let amps = self.motor.total_current_directional_filtered();
        for peer in fleet.peers() {
            let _ = self.bus.send_current(peer.id, amps);
        }
    }
}
