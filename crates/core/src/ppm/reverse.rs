//! Advanced reverse for plain current mode
//!
//! Above the direction threshold negative authority always brakes. Below it,
//! the first negative request brakes and only a neutral sample afterwards
//! unlocks reverse current, so forward never flips straight into reverse.

/// Idle debounce between braking and reversing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdleState {
    /// No brake since the last forward drive
    #[default]
    NotIdled,
    /// Braked once, waiting for a neutral sample
    BrakedOnce,
    /// Neutral seen after braking, reverse is allowed
    ReverseAllowed,
}

/// Direction guard state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReverseGuard {
    force_brake: bool,
    idle: IdleState,
}

impl Default for ReverseGuard {
    fn default() -> Self {
        Self {
            force_brake: true,
            idle: IdleState::NotIdled,
        }
    }
}

impl ReverseGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn force_brake(&self) -> bool {
        self.force_brake
    }

    pub fn idle(&self) -> IdleState {
        self.idle
    }

    /// Update the force-brake latch from local speed, with hysteresis
    pub fn observe_speed(&mut self, rpm: f32, threshold: f32, hysteresis: f32) {
        if self.force_brake {
            if rpm < threshold - hysteresis {
                self.force_brake = false;
                self.idle = IdleState::NotIdled;
            }
        } else if rpm > threshold + hysteresis {
            self.force_brake = true;
            self.idle = IdleState::NotIdled;
        }
    }

    /// Account for a non-negative authority sample
    pub fn observe_forward(&mut self, authority: f32, rpm: f32, threshold: f32) {
        if authority == 0.0 {
            if self.idle == IdleState::BrakedOnce && !self.force_brake {
                self.idle = IdleState::ReverseAllowed;
            }
        } else if rpm > -threshold {
            self.idle = IdleState::NotIdled;
        }
    }

    /// Decide a negative authority sample; `true` means brake, `false` reverse
    pub fn request_reverse(&mut self, rpm: f32, threshold: f32) -> bool {
        if self.force_brake {
            return true;
        }
        if rpm > -threshold {
            if self.idle != IdleState::ReverseAllowed {
                self.idle = IdleState::BrakedOnce;
                return true;
            }
            false
        } else if self.idle == IdleState::BrakedOnce {
            true
        } else {
            // Already reversing fast, braking now would be abrupt
            self.idle = IdleState::ReverseAllowed;
            false
        }
    }
}
