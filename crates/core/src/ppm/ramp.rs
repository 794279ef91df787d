//! Authority ramping and timeout recovery
//!
//! While the command stream is lost the ramp tracks what the motor is really
//! doing, so that on recovery the loop resumes from the actual output instead
//! of from the last commanded authority.

use super::config::PpmConfig;
use super::math::{abs, clamp, sign, step_towards};
use crate::traits::MotorLimits;

/// Ramp times at or below this (s) disable ramping
pub const MIN_RAMP_TIME: f32 = 0.01;

/// Ramped authority for one cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RampOutput {
    pub authority: f32,
    /// Milliseconds since the previous ramp update
    pub passed_ms: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RampState {
    value: f32,
    recovering: bool,
    last_ms: u32,
}

impl RampState {
    pub fn new(now_ms: u32) -> Self {
        Self {
            value: 0.0,
            recovering: false,
            last_ms: now_ms,
        }
    }

    /// Current ramp value, always within [-1, 1]
    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn is_recovering(&self) -> bool {
        self.recovering
    }

    /// Mark the loop as timed out; returns `true` on the triggering edge
    pub fn enter_timeout(&mut self) -> bool {
        let edge = !self.recovering;
        self.recovering = true;
        edge
    }

    /// Follow the actual motor output while timed out
    ///
    /// `total` is the signed total current, `directional` carries the
    /// direction of rotation.
    pub fn track_motor(&mut self, total: f32, directional: f32, limits: &MotorLimits, now_ms: u32) {
        let limit = if total < 0.0 {
            limits.current_min
        } else {
            limits.current_max
        };
        self.value = if limit != 0.0 {
            clamp(total / limit * sign(directional), -1.0, 1.0)
        } else {
            0.0
        };
        self.last_ms = now_ms;
    }

    /// Drop to neutral after a motor fault
    pub fn reset(&mut self, now_ms: u32) {
        self.value = 0.0;
        self.last_ms = now_ms;
    }

    /// Ramp toward `target`
    ///
    /// Normal operation uses the configured accel/brake times. While
    /// recovering from a timeout the times derive from the current limits
    /// instead; recovery ends exactly when the ramp reaches the target.
    pub fn apply(&mut self, target: f32, config: &PpmConfig, limits: &MotorLimits, now_ms: u32) -> RampOutput {
        let toward_zero =
            (self.value < 0.0 && target > self.value) || (self.value > 0.0 && target < self.value);
        let ramp_time = match (toward_zero, self.recovering) {
            (true, true) => limits.current_max / 50.0,
            (true, false) => config.ramp_time_neg,
            (false, true) => abs(limits.current_min) / 20.0,
            (false, false) => config.ramp_time_pos,
        };

        let passed_ms = now_ms.wrapping_sub(self.last_ms) as f32;
        self.last_ms = now_ms;

        if ramp_time > MIN_RAMP_TIME {
            let step = passed_ms / (ramp_time * 1000.0);
            if step_towards(&mut self.value, target, step) {
                self.recovering = false;
            }
        } else {
            self.value = target;
            self.recovering = false;
        }

        RampOutput {
            authority: self.value,
            passed_ms,
        }
    }
}
