//! Transmission relay parameters
//!
//! - `TX_SWITCH_ERPM` - Speed (erpm) at which the relay engages

use super::error::ParameterError;
use super::storage::{ParamValue, ParameterStore};
use crate::transmission::DEFAULT_SWITCH_ERPM;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransmissionParams {
    pub switch_erpm: f32,
}

impl TransmissionParams {
    pub fn register_defaults(store: &mut ParameterStore) -> Result<(), ParameterError> {
        store.register("TX_SWITCH_ERPM", ParamValue::Float(DEFAULT_SWITCH_ERPM))
    }

    pub fn from_store(store: &ParameterStore) -> Self {
        Self {
            switch_erpm: store.get_f32_or("TX_SWITCH_ERPM", DEFAULT_SWITCH_ERPM),
        }
    }
}
