//! Motor interface collaborator
//!
//! The commutation, current/duty/speed loops and fault detection live behind
//! this trait. The control loop and the watchdog both hold a shared reference
//! and issue last-write-wins commands, so every method takes `&self`.

use core::cell::Cell;

use crate::ppm::CruiseStatus;

/// Motor dispatch error types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorError {
    /// Driver refused the command (locked, not initialized)
    Rejected,
    /// Hardware failure while applying the command
    HardwareFault,
}

impl MotorError {
    pub fn name(self) -> &'static str {
        match self {
            MotorError::Rejected => "Rejected",
            MotorError::HardwareFault => "HardwareFault",
        }
    }
}

impl core::fmt::Display for MotorError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MotorError::Rejected => write!(f, "motor command rejected"),
            MotorError::HardwareFault => write!(f, "motor hardware fault"),
        }
    }
}

/// Active fault reported by the motor driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultCode {
    OverVoltage,
    UnderVoltage,
    GateDriver,
    AbsOverCurrent,
    OverTempFet,
    OverTempMotor,
}

impl FaultCode {
    /// Name for logging
    pub fn name(self) -> &'static str {
        match self {
            FaultCode::OverVoltage => "OverVoltage",
            FaultCode::UnderVoltage => "UnderVoltage",
            FaultCode::GateDriver => "GateDriver",
            FaultCode::AbsOverCurrent => "AbsOverCurrent",
            FaultCode::OverTempFet => "OverTempFet",
            FaultCode::OverTempMotor => "OverTempMotor",
        }
    }
}

impl core::fmt::Display for FaultCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            FaultCode::OverVoltage => write!(f, "over voltage"),
            FaultCode::UnderVoltage => write!(f, "under voltage"),
            FaultCode::GateDriver => write!(f, "gate driver"),
            FaultCode::AbsOverCurrent => write!(f, "absolute over current"),
            FaultCode::OverTempFet => write!(f, "FET over temperature"),
            FaultCode::OverTempMotor => write!(f, "motor over temperature"),
        }
    }
}

/// Snapshot of the motor configuration read once per loop cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotorLimits {
    /// Present maximum motor current (A, positive)
    pub current_max: f32,
    /// Present minimum motor current (A, negative)
    pub current_min: f32,
    /// Maximum duty cycle
    pub max_duty: f32,
    /// Maximum electrical speed (erpm)
    pub max_erpm: f32,
    /// Minimum erpm at which speed control may engage
    pub speed_min_erpm: f32,
    /// Driving currents below this are cut to zero after traction control
    pub min_current: f32,
}

impl Default for MotorLimits {
    fn default() -> Self {
        Self {
            current_max: 60.0,
            current_min: -60.0,
            max_duty: 0.95,
            max_erpm: 100_000.0,
            speed_min_erpm: 900.0,
            min_current: 0.1,
        }
    }
}

/// Motor interface (platform-independent)
pub trait MotorInterface {
    /// Read the present limits snapshot
    fn limits(&self) -> MotorLimits;

    /// Command a signed motor current (A)
    ///
    /// # Errors
    ///
    /// Returns `MotorError` if the driver refuses the command.
    fn set_current(&self, amps: f32) -> Result<(), MotorError>;

    /// Command a brake current (A, magnitude)
    fn set_brake_current(&self, amps: f32) -> Result<(), MotorError>;

    /// Command a signed duty cycle
    fn set_duty(&self, duty: f32) -> Result<(), MotorError>;

    /// Command a signed speed (erpm)
    fn set_speed(&self, erpm: f32) -> Result<(), MotorError>;

    /// Command a speed and publish the cruise status that requested it
    fn set_speed_with_cruise(&self, erpm: f32, status: CruiseStatus) -> Result<(), MotorError>;

    /// Total motor current, signed (negative while generating)
    fn total_current(&self) -> f32;

    /// Total motor current, signed by direction of rotation
    fn total_current_directional(&self) -> f32;

    /// Filtered variant of [`MotorInterface::total_current_directional`]
    fn total_current_directional_filtered(&self) -> f32;

    /// Electrical speed (erpm, signed)
    fn rpm(&self) -> f32;

    /// Active fault, if any
    fn fault(&self) -> Option<FaultCode>;

    /// Cruise status published by this node
    fn cruise_status(&self) -> CruiseStatus;

    /// Publish this node's cruise status
    fn set_cruise_status(&self, status: CruiseStatus);

    /// Hold the motor interface for exclusive use by another application
    fn lock(&self);

    /// Release an external hold
    fn unlock(&self);
}

impl<T: MotorInterface + ?Sized> MotorInterface for &T {
    fn limits(&self) -> MotorLimits {
        (**self).limits()
    }
    fn set_current(&self, amps: f32) -> Result<(), MotorError> {
        (**self).set_current(amps)
    }
    fn set_brake_current(&self, amps: f32) -> Result<(), MotorError> {
        (**self).set_brake_current(amps)
    }
    fn set_duty(&self, duty: f32) -> Result<(), MotorError> {
        (**self).set_duty(duty)
    }
    fn set_speed(&self, erpm: f32) -> Result<(), MotorError> {
        (**self).set_speed(erpm)
    }
    fn set_speed_with_cruise(&self, erpm: f32, status: CruiseStatus) -> Result<(), MotorError> {
        (**self).set_speed_with_cruise(erpm, status)
    }
    fn total_current(&self) -> f32 {
        (**self).total_current()
    }
    fn total_current_directional(&self) -> f32 {
        (**self).total_current_directional()
    }
    fn total_current_directional_filtered(&self) -> f32 {
        (**self).total_current_directional_filtered()
    }
    fn rpm(&self) -> f32 {
        (**self).rpm()
    }
    fn fault(&self) -> Option<FaultCode> {
        (**self).fault()
    }
    fn cruise_status(&self) -> CruiseStatus {
        (**self).cruise_status()
    }
    fn set_cruise_status(&self, status: CruiseStatus) {
        (**self).set_cruise_status(status)
    }
    fn lock(&self) {
        (**self).lock()
    }
    fn unlock(&self) {
        (**self).unlock()
    }
}

// ============================================================================
// Mock Implementation (always available for testing)
// ============================================================================

/// Command recorded by [`MockMotor`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotorCommand {
    Current(f32),
    Brake(f32),
    Duty(f32),
    Speed(f32),
    CruiseSpeed(f32, CruiseStatus),
}

/// Mock motor with settable telemetry and a record of the last command
#[derive(Default)]
pub struct MockMotor {
    limits: Cell<MotorLimits>,
    rpm: Cell<f32>,
    total_current: Cell<f32>,
    directional_current: Cell<f32>,
    filtered_current: Cell<f32>,
    fault: Cell<Option<FaultCode>>,
    cruise: Cell<CruiseStatus>,
    locked: Cell<bool>,
    reject: Cell<bool>,
    last: Cell<Option<MotorCommand>>,
    count: Cell<usize>,
}

impl MockMotor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: MotorLimits) -> Self {
        let motor = Self::default();
        motor.limits.set(limits);
        motor
    }

    pub fn set_rpm(&self, rpm: f32) {
        self.rpm.set(rpm);
    }

    /// Set signed total current and derive the directional value from rpm sign
    pub fn set_total_current(&self, amps: f32) {
        self.total_current.set(amps);
        let direction = if self.rpm.get() < 0.0 { -1.0 } else { 1.0 };
        self.directional_current.set(amps * direction);
        self.filtered_current.set(amps * direction);
    }

    pub fn set_directional_current(&self, amps: f32) {
        self.directional_current.set(amps);
    }

    pub fn set_filtered_current(&self, amps: f32) {
        self.filtered_current.set(amps);
    }

    pub fn set_fault(&self, fault: Option<FaultCode>) {
        self.fault.set(fault);
    }

    /// Make every subsequent command fail with `MotorError::Rejected`
    pub fn set_reject(&self, reject: bool) {
        self.reject.set(reject);
    }

    pub fn last_command(&self) -> Option<MotorCommand> {
        self.last.get()
    }

    pub fn command_count(&self) -> usize {
        self.count.get()
    }

    pub fn is_locked(&self) -> bool {
        self.locked.get()
    }

    fn record(&self, command: MotorCommand) -> Result<(), MotorError> {
        if self.reject.get() {
            return Err(MotorError::Rejected);
        }
        self.last.set(Some(command));
        self.count.set(self.count.get() + 1);
        Ok(())
    }
}

impl MotorInterface for MockMotor {
    fn limits(&self) -> MotorLimits {
        self.limits.get()
    }

    fn set_current(&self, amps: f32) -> Result<(), MotorError> {
        self.record(MotorCommand::Current(amps))
    }

    fn set_brake_current(&self, amps: f32) -> Result<(), MotorError> {
        self.record(MotorCommand::Brake(amps))
    }

    fn set_duty(&self, duty: f32) -> Result<(), MotorError> {
        self.record(MotorCommand::Duty(duty))
    }

    fn set_speed(&self, erpm: f32) -> Result<(), MotorError> {
        self.record(MotorCommand::Speed(erpm))
    }

    fn set_speed_with_cruise(&self, erpm: f32, status: CruiseStatus) -> Result<(), MotorError> {
        self.record(MotorCommand::CruiseSpeed(erpm, status))
    }

    fn total_current(&self) -> f32 {
        self.total_current.get()
    }

    fn total_current_directional(&self) -> f32 {
        self.directional_current.get()
    }

    fn total_current_directional_filtered(&self) -> f32 {
        self.filtered_current.get()
    }

    fn rpm(&self) -> f32 {
        self.rpm.get()
    }

    fn fault(&self) -> Option<FaultCode> {
        self.fault.get()
    }

    fn cruise_status(&self) -> CruiseStatus {
        self.cruise.get()
    }

    fn set_cruise_status(&self, status: CruiseStatus) {
        self.cruise.set(status);
    }

    fn lock(&self) {
        self.locked.set(true);
    }

    fn unlock(&self) {
        self.locked.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_records_last_command() {
        let motor = MockMotor::new();
        motor.set_current(3.0).unwrap();
        motor.set_brake_current(1.5).unwrap();
        assert_eq!(motor.last_command(), Some(MotorCommand::Brake(1.5)));
        assert_eq!(motor.command_count(), 2);
    }

    #[test]
    fn mock_reject_surfaces_error() {
        let motor = MockMotor::new();
        motor.set_reject(true);
        assert_eq!(motor.set_duty(0.2), Err(MotorError::Rejected));
        assert_eq!(motor.last_command(), None);
    }

    #[test]
    fn directional_current_follows_rotation() {
        let motor = MockMotor::new();
        motor.set_rpm(-1200.0);
        motor.set_total_current(8.0);
        assert_eq!(motor.total_current(), 8.0);
        assert_eq!(motor.total_current_directional(), -8.0);
    }

    #[test]
    fn reference_forwards_commands() {
        let motor = MockMotor::new();
        let by_ref: &dyn MotorInterface = &motor;
        (&by_ref).set_speed(1500.0).unwrap();
        assert_eq!(motor.last_command(), Some(MotorCommand::Speed(1500.0)));
    }
}
