//! Parameter management types and utilities
//!
//! The store holds named scalar values; each parameter group registers its
//! defaults and builds its typed configuration from the store.

pub mod error;
pub mod ppm;
pub mod storage;
pub mod timeout;
pub mod transmission;

pub use error::ParameterError;
pub use ppm::PpmParams;
pub use storage::{ParamGroup, ParamValue, ParameterStore};
pub use storage::{MAX_PARAMS, PARAM_NAME_LEN};
pub use timeout::TimeoutParams;
pub use transmission::TransmissionParams;

/// Register the defaults of every parameter group
pub fn register_all_defaults(store: &mut ParameterStore) -> Result<(), ParameterError> {
    PpmParams::register_defaults(store)?;
    TimeoutParams::register_defaults(store)?;
    TransmissionParams::register_defaults(store)?;
    Ok(())
}
