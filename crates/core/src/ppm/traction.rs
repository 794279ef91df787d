//! Slip limiting across the fleet

use super::config::TractionConfig;
use super::math::map_range;

/// Scale `value` down by the slip of a node spinning at `rpm`
///
/// Slip is measured against the lowest-magnitude fleet rpm. Up to the offset
/// `value` passes unchanged; from there it falls linearly to zero at
/// `max_diff` and stays at zero beyond it.
pub fn traction_scale(value: f32, rpm: f32, rpm_lowest: f32, tc: &TractionConfig) -> f32 {
    let slip = rpm - rpm_lowest;
    if slip <= tc.offset {
        return value;
    }
    let span = tc.max_diff - tc.offset;
    if span <= 0.0 {
        return 0.0;
    }
    let scaled = map_range(slip - tc.offset, 0.0, span, value, 0.0);
    if scaled * value < 0.0 {
        0.0
    } else {
        scaled
    }
}
