//! Small numeric helpers shared by the loop and the watchdog

use libm::fabsf;

/// Linear map of `x` from `[in_min, in_max]` onto `[out_min, out_max]`
///
/// No clamping; values outside the input range extrapolate.
pub fn map_range(x: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
    (x - in_min) * (out_max - out_min) / (in_max - in_min) + out_min
}

/// Move `value` toward `goal` by at most `step`, landing exactly on `goal`
///
/// Returns `true` once `value == goal`.
pub fn step_towards(value: &mut f32, goal: f32, step: f32) -> bool {
    if *value < goal {
        if *value + step < goal {
            *value += step;
        } else {
            *value = goal;
        }
    } else if *value > goal {
        if *value - step > goal {
            *value -= step;
        } else {
            *value = goal;
        }
    }
    *value == goal
}

/// Sign with zero counted as positive
pub fn sign(x: f32) -> f32 {
    if x < 0.0 {
        -1.0
    } else {
        1.0
    }
}

pub fn clamp(x: f32, min: f32, max: f32) -> f32 {
    if x < min {
        min
    } else if x > max {
        max
    } else {
        x
    }
}

/// Absolute value without relying on `std`
pub fn abs(x: f32) -> f32 {
    fabsf(x)
}
