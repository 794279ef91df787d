//! Command timeout parameters
//!
//! - `TO_TIMEOUT_MS` - Command timeout (ms), 0 disables the watchdog
//! - `TO_BRAKE_CUR` - Brake current target while timed out (A)

use super::error::ParameterError;
use super::storage::{ParamValue, ParameterStore};
use crate::watchdog::DEFAULT_TIMEOUT_MS;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeoutParams {
    pub timeout_ms: u32,
    pub brake_current: f32,
}

impl Default for TimeoutParams {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            brake_current: 0.0,
        }
    }
}

impl TimeoutParams {
    pub fn register_defaults(store: &mut ParameterStore) -> Result<(), ParameterError> {
        let d = Self::default();
        store.register("TO_TIMEOUT_MS", ParamValue::Int(d.timeout_ms as i32))?;
        store.register("TO_BRAKE_CUR", ParamValue::Float(d.brake_current))?;
        Ok(())
    }

    /// Negative timeouts read as disabled
    pub fn from_store(store: &ParameterStore) -> Self {
        let d = Self::default();
        let timeout_ms = match store.get("TO_TIMEOUT_MS") {
            Some(ParamValue::Int(v)) => (*v).max(0) as u32,
            Some(ParamValue::Float(v)) if *v > 0.0 => *v as u32,
            Some(_) => 0,
            None => d.timeout_ms,
        };
        Self {
            timeout_ms,
            brake_current: store.get_f32_or("TO_BRAKE_CUR", d.brake_current),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.timeout_ms > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_store_defaults() {
        let mut store = ParameterStore::new();
        TimeoutParams::register_defaults(&mut store).unwrap();
        let params = TimeoutParams::from_store(&store);
        assert_eq!(params, TimeoutParams::default());
        assert!(params.is_enabled());
    }

    #[test]
    fn test_negative_timeout_disables() {
        let mut store = ParameterStore::new();
        TimeoutParams::register_defaults(&mut store).unwrap();
        store.set("TO_TIMEOUT_MS", ParamValue::Int(-5)).unwrap();
        store.set("TO_BRAKE_CUR", ParamValue::Float(12.0)).unwrap();
        let params = TimeoutParams::from_store(&store);
        assert!(!params.is_enabled());
        assert!((params.brake_current - 12.0).abs() < f32::EPSILON);
    }
}
