//! PPM application configuration
//!
//! `PpmConfig` is the unit of reconfiguration: the firmware swaps a whole
//! value in between two loop cycles, never individual fields.

/// Control mode selected for the throttle channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ControlMode {
    /// Application disabled, no command is issued
    None = 0,
    /// Current control with reverse
    Current = 1,
    /// Current control, full pulse range is forward only
    CurrentNoReverse = 2,
    /// Current control, lower half of the pulse range brakes
    CurrentNoReverseBrake = 3,
    /// Duty cycle control with reverse
    Duty = 4,
    /// Duty cycle control, full pulse range is forward only
    DutyNoReverse = 5,
    /// Speed control with reverse
    Speed = 6,
    /// Speed control, full pulse range is forward only
    SpeedNoReverse = 7,
    /// Speed hold that can only coast down, lower half brakes
    SpeedNoAcceleration = 8,
    /// Channel only selects the cruise side, no motor command
    CruiseSecondaryChannel = 9,
}

impl ControlMode {
    /// Decode from the stored discriminant, unknown values map to `None`
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => ControlMode::Current,
            2 => ControlMode::CurrentNoReverse,
            3 => ControlMode::CurrentNoReverseBrake,
            4 => ControlMode::Duty,
            5 => ControlMode::DutyNoReverse,
            6 => ControlMode::Speed,
            7 => ControlMode::SpeedNoReverse,
            8 => ControlMode::SpeedNoAcceleration,
            9 => ControlMode::CruiseSecondaryChannel,
            _ => ControlMode::None,
        }
    }

    /// Modes that use the whole pulse window as forward throttle
    pub fn is_forward_only(self) -> bool {
        matches!(
            self,
            ControlMode::CurrentNoReverse | ControlMode::DutyNoReverse | ControlMode::SpeedNoReverse
        )
    }

    /// Whether a valid pulse in this mode feeds the timeout watchdog
    pub fn feeds_watchdog(self) -> bool {
        !matches!(self, ControlMode::None | ControlMode::CruiseSecondaryChannel)
    }

    /// Name for logging
    pub fn name(self) -> &'static str {
        match self {
            ControlMode::None => "None",
            ControlMode::Current => "Current",
            ControlMode::CurrentNoReverse => "CurrentNoReverse",
            ControlMode::CurrentNoReverseBrake => "CurrentNoReverseBrake",
            ControlMode::Duty => "Duty",
            ControlMode::DutyNoReverse => "DutyNoReverse",
            ControlMode::Speed => "Speed",
            ControlMode::SpeedNoReverse => "SpeedNoReverse",
            ControlMode::SpeedNoAcceleration => "SpeedNoAcceleration",
            ControlMode::CruiseSecondaryChannel => "CruiseSecondaryChannel",
        }
    }
}

/// Throttle curve shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ThrottleCurveMode {
    Exponential = 0,
    Natural = 1,
    Polynomial = 2,
    Linear = 3,
}

impl ThrottleCurveMode {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => ThrottleCurveMode::Exponential,
            1 => ThrottleCurveMode::Natural,
            2 => ThrottleCurveMode::Polynomial,
            _ => ThrottleCurveMode::Linear,
        }
    }
}

/// Cruise control status published by a node
///
/// Latched by the secondary-channel node and broadcast with every status
/// frame, so any node in the fleet can see which side requested cruise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum CruiseStatus {
    #[default]
    Inactive = 0,
    ActiveLeft = 1,
    ActiveRight = 2,
}

impl CruiseStatus {
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => CruiseStatus::ActiveLeft,
            2 => CruiseStatus::ActiveRight,
            _ => CruiseStatus::Inactive,
        }
    }

    pub fn is_active(self) -> bool {
        self != CruiseStatus::Inactive
    }
}

/// Traction control parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TractionConfig {
    /// Enable slip limiting across the fleet
    pub enabled: bool,
    /// Slip (erpm) below which authority is untouched
    pub offset: f32,
    /// Slip (erpm) at which authority reaches zero
    pub max_diff: f32,
}

/// Complete PPM configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PpmConfig {
    pub mode: ControlMode,
    /// Pulse width for full reverse / zero throttle (ms)
    pub pulse_start: f32,
    /// Pulse width for neutral (ms)
    pub pulse_center: f32,
    /// Pulse width for full forward (ms)
    pub pulse_end: f32,
    /// Ask the decoder to median-filter captured pulses
    pub median_filter: bool,
    /// Deadband half-width around neutral, in normalized units
    pub deadband: f32,
    /// Throttle curve exponent for positive authority
    pub throttle_exp: f32,
    /// Throttle curve exponent for negative authority
    pub throttle_exp_brake: f32,
    pub throttle_exp_mode: ThrottleCurveMode,
    /// Seconds for a full-scale increase of authority magnitude
    pub ramp_time_pos: f32,
    /// Seconds for a full-scale decrease of authority magnitude
    pub ramp_time_neg: f32,
    /// Require a run of neutral pulses before the first command
    pub safe_start: bool,
    /// Coordinate with peers seen on the bus
    pub multi_esc: bool,
    pub traction: TractionConfig,
    /// Direction threshold (erpm) for advanced reverse
    pub max_erpm_for_dir: f32,
    /// Enable advanced reverse in Current mode
    pub max_erpm_for_dir_active: bool,
    /// Status published when the secondary channel is pushed left
    pub cruise_left: CruiseStatus,
    /// Status published when the secondary channel is pushed right
    pub cruise_right: CruiseStatus,
    /// Full-scale speed for the Speed modes (erpm)
    pub speed_max_erpm: f32,
}

impl Default for PpmConfig {
    fn default() -> Self {
        Self {
            mode: ControlMode::None,
            pulse_start: 1.0,
            pulse_center: 1.5,
            pulse_end: 2.0,
            median_filter: true,
            deadband: 0.15,
            throttle_exp: 0.0,
            throttle_exp_brake: 0.0,
            throttle_exp_mode: ThrottleCurveMode::Exponential,
            ramp_time_pos: 0.3,
            ramp_time_neg: 0.1,
            safe_start: true,
            multi_esc: false,
            traction: TractionConfig {
                enabled: false,
                offset: 3000.0,
                max_diff: 6000.0,
            },
            max_erpm_for_dir: 4000.0,
            max_erpm_for_dir_active: false,
            cruise_left: CruiseStatus::ActiveLeft,
            cruise_right: CruiseStatus::ActiveRight,
            speed_max_erpm: 15000.0,
        }
    }
}

impl PpmConfig {
    /// Hysteresis band around the direction threshold
    pub fn direction_hysteresis(&self) -> f32 {
        self.max_erpm_for_dir * 0.20
    }
}
