//! PPM Parameter Definitions
//!
//! Every field of [`PpmConfig`] as a `PPM_*` parameter. Enum-valued fields are
//! stored as their `u8` discriminant.
//!
//! # Parameters
//!
//! - `PPM_CTRL_TYPE` - Control mode (0 = none ... 9 = cruise secondary channel)
//! - `PPM_PULSE_START` / `PPM_PULSE_CENTER` / `PPM_PULSE_END` - Pulse window (ms)
//! - `PPM_DEADBAND` - Deadband half-width (normalized)
//! - `PPM_THR_EXP` / `PPM_THR_EXP_BRK` / `PPM_THR_EXP_MODE` - Throttle curve
//! - `PPM_RAMP_POS` / `PPM_RAMP_NEG` - Ramp times (s)
//! - `PPM_TC*` - Traction control
//! - `PPM_DIR_ERPM` / `PPM_DIR_ACTIVE` - Advanced reverse threshold
//! - `PPM_CRUISE_LEFT` / `PPM_CRUISE_RIGHT` - Secondary channel assignment

use super::error::ParameterError;
use super::storage::{ParamValue, ParameterStore};
use crate::ppm::{ControlMode, CruiseStatus, PpmConfig, ThrottleCurveMode, TractionConfig};

/// PPM application parameters
#[derive(Debug, Clone, PartialEq)]
pub struct PpmParams {
    pub config: PpmConfig,
}

impl PpmParams {
    /// Register PPM parameters with default values
    pub fn register_defaults(store: &mut ParameterStore) -> Result<(), ParameterError> {
        let d = PpmConfig::default();

        store.register("PPM_CTRL_TYPE", ParamValue::Int(d.mode as i32))?;
        store.register("PPM_PULSE_START", ParamValue::Float(d.pulse_start))?;
        store.register("PPM_PULSE_CENTER", ParamValue::Float(d.pulse_center))?;
        store.register("PPM_PULSE_END", ParamValue::Float(d.pulse_end))?;
        store.register("PPM_MEDIAN_FILT", ParamValue::Bool(d.median_filter))?;
        store.register("PPM_DEADBAND", ParamValue::Float(d.deadband))?;
        store.register("PPM_THR_EXP", ParamValue::Float(d.throttle_exp))?;
        store.register("PPM_THR_EXP_BRK", ParamValue::Float(d.throttle_exp_brake))?;
        store.register("PPM_THR_EXP_MODE", ParamValue::Int(d.throttle_exp_mode as i32))?;
        store.register("PPM_RAMP_POS", ParamValue::Float(d.ramp_time_pos))?;
        store.register("PPM_RAMP_NEG", ParamValue::Float(d.ramp_time_neg))?;
        store.register("PPM_SAFE_START", ParamValue::Bool(d.safe_start))?;
        store.register("PPM_MULTI_ESC", ParamValue::Bool(d.multi_esc))?;
        store.register("PPM_TC", ParamValue::Bool(d.traction.enabled))?;
        store.register("PPM_TC_OFFSET", ParamValue::Float(d.traction.offset))?;
        store.register("PPM_TC_MAX_DIFF", ParamValue::Float(d.traction.max_diff))?;
        store.register("PPM_DIR_ERPM", ParamValue::Float(d.max_erpm_for_dir))?;
        store.register("PPM_DIR_ACTIVE", ParamValue::Bool(d.max_erpm_for_dir_active))?;
        store.register("PPM_CRUISE_LEFT", ParamValue::Int(d.cruise_left as i32))?;
        store.register("PPM_CRUISE_RIGHT", ParamValue::Int(d.cruise_right as i32))?;
        store.register("PPM_SPD_MAX_ERPM", ParamValue::Float(d.speed_max_erpm))?;

        Ok(())
    }

    /// Load PPM parameters from parameter store
    ///
    /// Missing entries fall back to the defaults, out-of-range discriminants
    /// decode to the enum's fallback variant.
    pub fn from_store(store: &ParameterStore) -> Self {
        let d = PpmConfig::default();

        let discriminant = |name: &str, default: u8| -> u8 {
            let raw = store.get_i32_or(name, default as i32);
            u8::try_from(raw).unwrap_or(u8::MAX)
        };

        let config = PpmConfig {
            mode: ControlMode::from_u8(discriminant("PPM_CTRL_TYPE", d.mode as u8)),
            pulse_start: store.get_f32_or("PPM_PULSE_START", d.pulse_start),
            pulse_center: store.get_f32_or("PPM_PULSE_CENTER", d.pulse_center),
            pulse_end: store.get_f32_or("PPM_PULSE_END", d.pulse_end),
            median_filter: store.get_bool_or("PPM_MEDIAN_FILT", d.median_filter),
            deadband: store.get_f32_or("PPM_DEADBAND", d.deadband),
            throttle_exp: store.get_f32_or("PPM_THR_EXP", d.throttle_exp),
            throttle_exp_brake: store.get_f32_or("PPM_THR_EXP_BRK", d.throttle_exp_brake),
            throttle_exp_mode: ThrottleCurveMode::from_u8(discriminant(
                "PPM_THR_EXP_MODE",
                d.throttle_exp_mode as u8,
            )),
            ramp_time_pos: store.get_f32_or("PPM_RAMP_POS", d.ramp_time_pos),
            ramp_time_neg: store.get_f32_or("PPM_RAMP_NEG", d.ramp_time_neg),
            safe_start: store.get_bool_or("PPM_SAFE_START", d.safe_start),
            multi_esc: store.get_bool_or("PPM_MULTI_ESC", d.multi_esc),
            traction: TractionConfig {
                enabled: store.get_bool_or("PPM_TC", d.traction.enabled),
                offset: store.get_f32_or("PPM_TC_OFFSET", d.traction.offset),
                max_diff: store.get_f32_or("PPM_TC_MAX_DIFF", d.traction.max_diff),
            },
            max_erpm_for_dir: store.get_f32_or("PPM_DIR_ERPM", d.max_erpm_for_dir),
            max_erpm_for_dir_active: store.get_bool_or("PPM_DIR_ACTIVE", d.max_erpm_for_dir_active),
            cruise_left: CruiseStatus::from_u8(discriminant("PPM_CRUISE_LEFT", d.cruise_left as u8)),
            cruise_right: CruiseStatus::from_u8(discriminant(
                "PPM_CRUISE_RIGHT",
                d.cruise_right as u8,
            )),
            speed_max_erpm: store.get_f32_or("PPM_SPD_MAX_ERPM", d.speed_max_erpm),
        };

        Self { config }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_defaults_round_trip() {
        let mut store = ParameterStore::new();
        PpmParams::register_defaults(&mut store).unwrap();
        assert_eq!(store.len(), 21);
        assert_eq!(PpmParams::from_store(&store).config, PpmConfig::default());
    }

    #[test]
    fn test_empty_store_gives_defaults() {
        let store = ParameterStore::new();
        assert_eq!(PpmParams::from_store(&store).config, PpmConfig::default());
    }

    #[test]
    fn test_from_store_custom_values() {
        let mut store = ParameterStore::new();
        PpmParams::register_defaults(&mut store).unwrap();

        store
            .set("PPM_CTRL_TYPE", ParamValue::Int(ControlMode::Duty as i32))
            .unwrap();
        store.set("PPM_SAFE_START", ParamValue::Bool(false)).unwrap();
        store.set("PPM_TC_OFFSET", ParamValue::Int(2500)).unwrap();
        store.set("PPM_CRUISE_LEFT", ParamValue::Int(0)).unwrap();

        let config = PpmParams::from_store(&store).config;
        assert_eq!(config.mode, ControlMode::Duty);
        assert!(!config.safe_start);
        assert!((config.traction.offset - 2500.0).abs() < f32::EPSILON);
        assert_eq!(config.cruise_left, CruiseStatus::Inactive);
    }

    #[test]
    fn test_unknown_mode_is_none() {
        let mut store = ParameterStore::new();
        PpmParams::register_defaults(&mut store).unwrap();
        store.set("PPM_CTRL_TYPE", ParamValue::Int(-3)).unwrap();
        assert_eq!(PpmParams::from_store(&store).config.mode, ControlMode::None);
    }
}
