//! Control mode engine
//!
//! Turns ramped authority plus the fleet view into one motor command per
//! cycle. Per-mode memory lives in [`ModeState`] and is rebuilt on every
//! configuration, so switching modes never inherits another mode's state.

use super::config::{ControlMode, CruiseStatus, PpmConfig};
use super::cruise::{RpmAverage, SpeedTarget};
use super::fleet::FleetSnapshot;
use super::math::abs;
use super::reverse::ReverseGuard;
use super::safe_start::{SafeStartGate, NEAR_ZERO};
use crate::traits::MotorLimits;

/// Command resolved for the local motor
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Signed driving current (A)
    Current(f32),
    /// Brake current magnitude (A)
    Brake(f32),
    /// Signed duty cycle
    Duty(f32),
    /// Direct speed command (erpm)
    Speed(f32),
    /// Hold the fleet speed target
    ///
    /// `erpm` is the local command, `offset` the target minus the fleet mean
    /// that every peer adds to its own rpm.
    HoldSpeed {
        erpm: f32,
        offset: f32,
        cruise: Option<CruiseStatus>,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Current(_) => "current",
            Command::Brake(_) => "brake",
            Command::Duty(_) => "duty",
            Command::Speed(_) => "speed",
            Command::HoldSpeed { .. } => "hold speed",
        }
    }
}

/// Command plus the authority it was derived from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub command: Command,
    /// Authority after mode adjustments, used for relative peer commands
    pub authority: f32,
}

/// Per-mode memory
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModeState {
    Stateless,
    AdvancedReverse(ReverseGuard),
    NoAcceleration(RpmAverage),
}

impl ModeState {
    pub fn for_config(config: &PpmConfig) -> Self {
        match config.mode {
            ControlMode::Current if config.max_erpm_for_dir_active => {
                ModeState::AdvancedReverse(ReverseGuard::new())
            }
            ControlMode::SpeedNoAcceleration => ModeState::NoAcceleration(RpmAverage::new()),
            _ => ModeState::Stateless,
        }
    }
}

/// Inputs of one engine evaluation
#[derive(Debug, Clone, Copy)]
pub struct EngineInput<'a> {
    pub authority: f32,
    pub fleet: &'a FleetSnapshot,
    pub limits: &'a MotorLimits,
    /// Milliseconds since the previous ramp update
    pub passed_ms: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Engine {
    mode: ModeState,
    target: SpeedTarget,
    gate: SafeStartGate,
}

impl Engine {
    pub fn new(config: &PpmConfig) -> Self {
        Self {
            mode: ModeState::for_config(config),
            target: SpeedTarget::new(),
            gate: SafeStartGate::new(),
        }
    }

    pub fn mode_state(&self) -> &ModeState {
        &self.mode
    }

    pub fn speed_target(&self) -> Option<f32> {
        self.target.get()
    }

    pub fn clear_speed_target(&mut self) {
        self.target.clear();
    }

    pub fn gate(&self) -> &SafeStartGate {
        &self.gate
    }

    /// Drop the safe-start run after a fault
    pub fn clear_idle_count(&mut self) {
        self.gate.clear_count();
    }

    /// Check the safe-start gate for this cycle
    pub fn gate_open(&mut self, safe_start: bool) -> bool {
        self.gate.check(safe_start)
    }

    /// Resolve this cycle's command; `None` for modes that never drive
    pub fn compute(&mut self, config: &PpmConfig, input: EngineInput<'_>) -> Option<Decision> {
        let EngineInput {
            authority,
            fleet,
            limits,
            passed_ms,
        } = input;

        let (command, authority) = match config.mode {
            ControlMode::None | ControlMode::CruiseSecondaryChannel => return None,
            ControlMode::Current => {
                let (command, authority) = if let ModeState::AdvancedReverse(guard) = &mut self.mode {
                    let rpm = fleet.rpm_local;
                    let threshold = config.max_erpm_for_dir;
                    guard.observe_speed(rpm, threshold, config.direction_hysteresis());
                    if authority >= 0.0 {
                        guard.observe_forward(authority, rpm, threshold);
                        self.drive_forward(authority, fleet, limits, passed_ms)
                    } else if guard.request_reverse(rpm, threshold) {
                        (Command::Brake(abs(authority * limits.current_min)), authority)
                    } else {
                        (Command::Current(authority * abs(limits.current_min)), authority)
                    }
                } else {
                    self.sign_matched(authority, fleet, limits, passed_ms)
                };
                if authority < NEAR_ZERO {
                    self.gate.record_idle();
                }
                (command, authority)
            }
            ControlMode::CurrentNoReverse => {
                let (command, authority) = self.sign_matched(authority, fleet, limits, passed_ms);
                if abs(authority) < NEAR_ZERO {
                    self.gate.record_idle();
                }
                (command, authority)
            }
            ControlMode::CurrentNoReverseBrake => {
                let (command, authority) = if authority >= 0.0 {
                    self.drive_forward(authority, fleet, limits, passed_ms)
                } else {
                    (Command::Brake(abs(authority * limits.current_min)), authority)
                };
                if authority < NEAR_ZERO {
                    self.gate.record_idle();
                }
                (command, authority)
            }
            ControlMode::SpeedNoAcceleration => {
                let averaged = match &mut self.mode {
                    ModeState::NoAcceleration(average) => average.push(fleet.mid_rpm),
                    _ => fleet.mid_rpm,
                };
                let (command, authority) = if authority > 0.0 {
                    match self
                        .target
                        .coast_down(averaged, limits.speed_min_erpm, limits.max_erpm)
                    {
                        Some(target) => {
                            let offset = target - fleet.mid_rpm;
                            let command = Command::HoldSpeed {
                                erpm: fleet.rpm_local + offset,
                                offset,
                                cruise: None,
                            };
                            (command, authority)
                        }
                        None => (Command::Current(0.0), 0.0),
                    }
                } else if authority == 0.0 {
                    (Command::Current(0.0), 0.0)
                } else {
                    (Command::Brake(abs(authority * limits.current_min)), authority)
                };
                if authority < NEAR_ZERO {
                    self.gate.record_idle();
                }
                (command, authority)
            }
            ControlMode::Duty | ControlMode::DutyNoReverse => {
                if abs(authority) < NEAR_ZERO {
                    self.gate.record_idle();
                }
                (Command::Duty(authority * limits.max_duty), authority)
            }
            ControlMode::Speed | ControlMode::SpeedNoReverse => {
                if abs(authority) < NEAR_ZERO {
                    self.gate.record_idle();
                }
                (Command::Speed(authority * config.speed_max_erpm), authority)
            }
        };

        Some(Decision { command, authority })
    }

    /// Matching signs of authority and rotation drive, anything else brakes
    /// against the rotation with reverse-scaled current
    fn sign_matched(
        &mut self,
        authority: f32,
        fleet: &FleetSnapshot,
        limits: &MotorLimits,
        passed_ms: f32,
    ) -> (Command, f32) {
        let rpm = fleet.rpm_local;
        if (authority >= 0.0 && rpm > 0.0) || (authority < 0.0 && rpm < 0.0) {
            self.drive_forward(authority, fleet, limits, passed_ms)
        } else {
            (Command::Current(authority * abs(limits.current_min)), authority)
        }
    }

    /// Driving current, or the cruise speed hold when the fleet requests it
    fn drive_forward(
        &mut self,
        authority: f32,
        fleet: &FleetSnapshot,
        limits: &MotorLimits,
        passed_ms: f32,
    ) -> (Command, f32) {
        if !(fleet.cruise.is_active() && authority >= 0.0) {
            return (Command::Current(authority * limits.current_max), authority);
        }

        if abs(fleet.rpm_lowest) > limits.speed_min_erpm {
            if let Some(target) =
                self.target
                    .advance(fleet.mid_rpm, authority, passed_ms, limits.max_erpm)
            {
                let offset = target - fleet.mid_rpm;
                let command = Command::HoldSpeed {
                    erpm: fleet.rpm_local + offset,
                    offset,
                    cruise: Some(fleet.cruise),
                };
                return (command, authority);
            }
        }

        self.target.clear();
        (Command::Current(0.0), 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    fn limits() -> MotorLimits {
        MotorLimits {
            current_max: 50.0,
            current_min: -40.0,
            max_duty: 0.8,
            max_erpm: 40_000.0,
            speed_min_erpm: 900.0,
            min_current: 0.5,
        }
    }

    fn config(mode: ControlMode) -> PpmConfig {
        PpmConfig {
            mode,
            ..PpmConfig::default()
        }
    }

    fn run(engine: &mut Engine, cfg: &PpmConfig, authority: f32, fleet: &FleetSnapshot) -> Decision {
        engine
            .compute(
                cfg,
                EngineInput {
                    authority,
                    fleet,
                    limits: &limits(),
                    passed_ms: 10.0,
                },
            )
            .unwrap()
    }

    #[test]
    fn duty_maps_onto_max_duty() {
        let cfg = config(ControlMode::Duty);
        let mut engine = Engine::new(&cfg);
        let fleet = FleetSnapshot::local(0.0, CruiseStatus::Inactive);
        let decision = run(&mut engine, &cfg, 0.5, &fleet);
        assert_eq!(decision.command, Command::Duty(0.4));
    }

    #[test]
    fn speed_uses_configured_max() {
        let cfg = PpmConfig {
            speed_max_erpm: 10_000.0,
            ..config(ControlMode::Speed)
        };
        let mut engine = Engine::new(&cfg);
        let fleet = FleetSnapshot::local(0.0, CruiseStatus::Inactive);
        assert_eq!(
            run(&mut engine, &cfg, -0.25, &fleet).command,
            Command::Speed(-2500.0)
        );
    }

    #[test]
    fn plain_current_is_sign_matched() {
        let cfg = config(ControlMode::Current);
        let mut engine = Engine::new(&cfg);
        let forward = FleetSnapshot::local(2000.0, CruiseStatus::Inactive);
        assert_eq!(run(&mut engine, &cfg, 0.5, &forward).command, Command::Current(25.0));
        assert_eq!(run(&mut engine, &cfg, -0.5, &forward).command, Command::Current(-20.0));
        let backward = FleetSnapshot::local(-2000.0, CruiseStatus::Inactive);
        assert_eq!(run(&mut engine, &cfg, -0.5, &backward).command, Command::Current(-25.0));
    }

    #[test]
    fn no_reverse_brake_brakes_on_negative() {
        let cfg = config(ControlMode::CurrentNoReverseBrake);
        let mut engine = Engine::new(&cfg);
        let fleet = FleetSnapshot::local(3000.0, CruiseStatus::Inactive);
        let decision = run(&mut engine, &cfg, -0.25, &fleet);
        assert_eq!(decision.command, Command::Brake(10.0));
        assert_eq!(decision.authority, -0.25);
    }

    #[test]
    fn advanced_reverse_brakes_before_reversing() {
        let cfg = PpmConfig {
            max_erpm_for_dir_active: true,
            ..config(ControlMode::Current)
        };
        let mut engine = Engine::new(&cfg);
        let slow = FleetSnapshot::local(0.0, CruiseStatus::Inactive);

        run(&mut engine, &cfg, 0.5, &slow);
        assert!(matches!(run(&mut engine, &cfg, -0.5, &slow).command, Command::Brake(_)));
        run(&mut engine, &cfg, 0.0, &slow);
        assert_eq!(run(&mut engine, &cfg, -0.5, &slow).command, Command::Current(-20.0));
    }

    #[test]
    fn advanced_reverse_force_brakes_at_speed() {
        let cfg = PpmConfig {
            max_erpm_for_dir_active: true,
            ..config(ControlMode::Current)
        };
        let mut engine = Engine::new(&cfg);
        let fast = FleetSnapshot::local(6000.0, CruiseStatus::Inactive);
        run(&mut engine, &cfg, 0.0, &fast);
        assert!(matches!(run(&mut engine, &cfg, -0.2, &fast).command, Command::Brake(_)));
    }

    #[test]
    fn cruise_holds_fleet_target() {
        let cfg = config(ControlMode::CurrentNoReverseBrake);
        let mut engine = Engine::new(&cfg);
        let fleet = FleetSnapshot::local(5000.0, CruiseStatus::ActiveLeft);
        let decision = run(&mut engine, &cfg, 0.2, &fleet);
        assert_eq!(
            decision.command,
            Command::HoldSpeed {
                erpm: 5000.0,
                offset: 0.0,
                cruise: Some(CruiseStatus::ActiveLeft),
            }
        );
        // 10 ms at 0.2 authority adds 6 erpm
        let decision = run(&mut engine, &cfg, 0.2, &fleet);
        match decision.command {
            Command::HoldSpeed { erpm, .. } => assert!((erpm - 5006.0).abs() < EPS),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn cruise_refused_when_fleet_too_slow() {
        let cfg = config(ControlMode::CurrentNoReverseBrake);
        let mut engine = Engine::new(&cfg);
        let fleet = FleetSnapshot::local(500.0, CruiseStatus::ActiveRight);
        let decision = run(&mut engine, &cfg, 0.6, &fleet);
        assert_eq!(decision.command, Command::Current(0.0));
        assert_eq!(decision.authority, 0.0);
        assert_eq!(engine.speed_target(), None);
    }

    #[test]
    fn no_acceleration_zero_throttle_coasts() {
        let cfg = config(ControlMode::SpeedNoAcceleration);
        let mut engine = Engine::new(&cfg);
        let fleet = FleetSnapshot::local(4000.0, CruiseStatus::Inactive);
        assert_eq!(run(&mut engine, &cfg, 0.0, &fleet).command, Command::Current(0.0));
        assert!(matches!(
            run(&mut engine, &cfg, -0.5, &fleet).command,
            Command::Brake(_)
        ));
    }

    #[test]
    fn no_acceleration_holds_averaged_speed() {
        let cfg = config(ControlMode::SpeedNoAcceleration);
        let mut engine = Engine::new(&cfg);
        let fleet = FleetSnapshot::local(4000.0, CruiseStatus::Inactive);
        // First average is 1000, target seeds there and the lead is negative
        let decision = run(&mut engine, &cfg, 0.5, &fleet);
        match decision.command {
            Command::HoldSpeed { erpm, offset, cruise } => {
                assert!((offset + 3000.0).abs() < EPS);
                assert!((erpm - 1000.0).abs() < EPS);
                assert_eq!(cruise, None);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn near_zero_cycles_are_counted_per_mode() {
        let cfg = config(ControlMode::Current);
        let mut engine = Engine::new(&cfg);
        let fleet = FleetSnapshot::local(0.0, CruiseStatus::Inactive);
        run(&mut engine, &cfg, -0.5, &fleet);
        assert_eq!(engine.gate().count(), 1);

        let cfg = config(ControlMode::Duty);
        let mut engine = Engine::new(&cfg);
        run(&mut engine, &cfg, -0.5, &fleet);
        assert_eq!(engine.gate().count(), 0);
    }

    #[test]
    fn inactive_modes_compute_nothing() {
        let cfg = config(ControlMode::CruiseSecondaryChannel);
        let mut engine = Engine::new(&cfg);
        let fleet = FleetSnapshot::local(0.0, CruiseStatus::Inactive);
        let input = EngineInput {
            authority: 0.5,
            fleet: &fleet,
            limits: &limits(),
            passed_ms: 2.0,
        };
        assert_eq!(engine.compute(&cfg, input), None);
    }
}
