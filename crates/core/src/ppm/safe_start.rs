//! Safe-start gate
//!
//! After (re)configuration no command is dispatched until the throttle has
//! been near zero for a run of consecutive cycles. The run counter is only
//! dropped to zero when two consecutive gate checks read the same count.

/// Near-zero cycles required before the first dispatch
pub const MIN_PULSES_WITHOUT_POWER: u32 = 50;

/// Authority magnitude regarded as zero throttle
pub const NEAR_ZERO: f32 = 0.001;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SafeStartGate {
    count: u32,
    before: u32,
}

impl SafeStartGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Count one near-zero cycle
    pub fn record_idle(&mut self) {
        self.count = self.count.saturating_add(1);
    }

    /// Drop the run after a fault, keeping the debounce history
    pub fn clear_count(&mut self) {
        self.count = 0;
    }

    /// Check the gate for this cycle; `true` lets the command through
    pub fn check(&mut self, enabled: bool) -> bool {
        if !enabled || self.count >= MIN_PULSES_WITHOUT_POWER {
            return true;
        }
        if self.count == self.before {
            self.count = 0;
        }
        self.before = self.count;
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(gate: &mut SafeStartGate, idle: bool) -> bool {
        if idle {
            gate.record_idle();
        }
        gate.check(true)
    }

    #[test]
    fn opens_on_fiftieth_idle_cycle() {
        let mut gate = SafeStartGate::new();
        for _ in 0..49 {
            assert!(!run(&mut gate, true));
        }
        assert!(run(&mut gate, true));
    }

    #[test]
    fn interruption_restarts_run() {
        let mut gate = SafeStartGate::new();
        for _ in 0..49 {
            assert!(!run(&mut gate, true));
        }
        assert!(!run(&mut gate, false));
        assert_eq!(gate.count(), 0);
        for _ in 0..49 {
            assert!(!run(&mut gate, true));
        }
        assert!(run(&mut gate, true));
    }

    #[test]
    fn disabled_gate_is_open() {
        let mut gate = SafeStartGate::new();
        assert!(gate.check(false));
    }

    #[test]
    fn stays_open_after_run() {
        let mut gate = SafeStartGate::new();
        for _ in 0..50 {
            run(&mut gate, true);
        }
        assert!(run(&mut gate, false));
    }
}
