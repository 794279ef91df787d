//! Pulse interpretation
//!
//! Turns the decoder's normalized reading into throttle authority:
//! center split (or forward-only rescale), deadband, then throttle curve.

use libm::{expf, fabsf, powf};

use super::config::{PpmConfig, ThrottleCurveMode};
use super::math::map_range;

/// Result of interpreting one decoder reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interpreted {
    /// Level before deadband, published as the decoded level
    pub level: f32,
    /// Level after deadband, before the throttle curve
    pub deadbanded: f32,
}

/// Interpret a normalized decoder value against the configured pulse window
pub fn interpret(config: &PpmConfig, normalized: f32) -> Interpreted {
    let (level, mapped) = if config.mode.is_forward_only() {
        (normalized, (normalized + 1.0) / 2.0)
    } else {
        let pulse_ms = map_range(normalized, -1.0, 1.0, config.pulse_start, config.pulse_end);
        let mapped = if pulse_ms < config.pulse_center {
            map_range(pulse_ms, config.pulse_start, config.pulse_center, -1.0, 0.0)
        } else {
            map_range(pulse_ms, config.pulse_center, config.pulse_end, 0.0, 1.0)
        };
        (mapped, mapped)
    };

    Interpreted {
        level,
        deadbanded: deadband(mapped, config.deadband, 1.0),
    }
}

/// Symmetric deadband around zero
///
/// Inside `threshold` the value is 0. Outside, it is rescaled so the band
/// edge maps to 0 while `max` stays `max`.
pub fn deadband(value: f32, threshold: f32, max: f32) -> f32 {
    if fabsf(value) < threshold {
        return 0.0;
    }
    let k = max / (max - threshold);
    if value > 0.0 {
        k * value + max * (1.0 - k)
    } else {
        -(k * -value + max * (1.0 - k))
    }
}

/// Sign-preserving throttle curve
///
/// `accel_exp` shapes positive authority, `brake_exp` negative authority.
pub fn throttle_curve(value: f32, accel_exp: f32, brake_exp: f32, mode: ThrottleCurveMode) -> f32 {
    let magnitude = fabsf(value);
    let exp = if value >= 0.0 { accel_exp } else { brake_exp };

    let shaped = match mode {
        ThrottleCurveMode::Exponential => {
            if exp >= 0.0 {
                1.0 - powf(1.0 - magnitude, 1.0 + exp)
            } else {
                powf(magnitude, 1.0 - exp)
            }
        }
        ThrottleCurveMode::Natural => {
            if fabsf(exp) < 1e-10 {
                magnitude
            } else if exp >= 0.0 {
                1.0 - ((expf(exp * (1.0 - magnitude)) - 1.0) / (expf(exp) - 1.0))
            } else {
                (expf(-exp * magnitude) - 1.0) / (expf(-exp) - 1.0)
            }
        }
        ThrottleCurveMode::Polynomial => {
            if exp >= 0.0 {
                1.0 - ((1.0 - magnitude) / (1.0 + exp * magnitude))
            } else {
                magnitude / (1.0 - (exp * (1.0 - magnitude)))
            }
        }
        ThrottleCurveMode::Linear => magnitude,
    };

    if value >= 0.0 {
        shaped
    } else {
        -shaped
    }
}
