//! Cruise control: secondary channel mapping and the speed-target integrator

use super::config::{CruiseStatus, PpmConfig};
use super::math::clamp;

/// Authority beyond which the secondary channel selects a cruise side
pub const SECONDARY_THRESHOLD: f32 = 0.3;

/// Target speed growth at full authority (erpm per second)
pub const TARGET_RATE_ERPM_PER_S: f32 = 3000.0;

/// How far the target may lead the fleet mean (erpm)
pub const TARGET_MAX_LEAD_ERPM: f32 = 3000.0;

/// Step by which the no-acceleration target coasts down each cycle (erpm)
pub const COAST_STEP_ERPM: f32 = 10.0;

/// Map secondary channel authority onto the published cruise status
pub fn secondary_channel_status(authority: f32, config: &PpmConfig) -> CruiseStatus {
    if authority < -SECONDARY_THRESHOLD && config.cruise_left.is_active() {
        config.cruise_left
    } else if authority > SECONDARY_THRESHOLD && config.cruise_right.is_active() {
        config.cruise_right
    } else {
        CruiseStatus::Inactive
    }
}

/// Integrated speed target shared by cruise and speed-hold modes
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpeedTarget {
    target: Option<f32>,
}

impl SpeedTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<f32> {
        self.target
    }

    pub fn clear(&mut self) {
        self.target = None;
    }

    /// Seed from the fleet mean or advance by authority over `passed_ms`
    ///
    /// Seeding is refused (returns `None`) when the fleet already runs faster
    /// than `max_erpm`. The result is kept within `[mid_rpm, mid_rpm + 3000]`
    /// and never above `max_erpm`.
    pub fn advance(&mut self, mid_rpm: f32, authority: f32, passed_ms: f32, max_erpm: f32) -> Option<f32> {
        let target = match self.target {
            None => {
                if mid_rpm > max_erpm {
                    return None;
                }
                mid_rpm
            }
            Some(target) => {
                let advanced = target + authority * TARGET_RATE_ERPM_PER_S * (passed_ms / 1000.0);
                clamp(advanced, mid_rpm, mid_rpm + TARGET_MAX_LEAD_ERPM)
            }
        };
        let target = if target > max_erpm { max_erpm } else { target };
        self.target = Some(target);
        self.target
    }

    /// Coast-down-only hold against the averaged fleet speed
    ///
    /// Returns the target to hold, or `None` when the fleet is too slow and
    /// the hold has been released.
    pub fn coast_down(&mut self, averaged_rpm: f32, min_erpm: f32, max_erpm: f32) -> Option<f32> {
        if self.target.is_none() && averaged_rpm < max_erpm {
            self.target = Some(averaged_rpm);
        }

        if averaged_rpm > min_erpm {
            if let Some(target) = self.target.as_mut() {
                let lead = *target - averaged_rpm;
                if lead > 1500.0 || (lead > 500.0 && averaged_rpm < 1500.0) {
                    *target -= COAST_STEP_ERPM;
                }
            }
        } else {
            self.target = None;
        }

        self.target.filter(|target| *target > 0.0)
    }
}

/// Samples in the fleet-speed moving average
pub const RPM_AVERAGE_SAMPLES: usize = 4;

/// Moving average of the fleet mean rpm over the last four cycles
///
/// Starts from zeros, so the first three averages are pulled toward zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RpmAverage {
    samples: [f32; RPM_AVERAGE_SAMPLES],
    next: usize,
    sum: f32,
}

impl RpmAverage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a sample and return the new average
    pub fn push(&mut self, rpm: f32) -> f32 {
        self.sum += rpm - self.samples[self.next];
        self.samples[self.next] = rpm;
        self.next = (self.next + 1) % RPM_AVERAGE_SAMPLES;
        self.sum / RPM_AVERAGE_SAMPLES as f32
    }
}
