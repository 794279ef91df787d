//! PPM throttle application
//!
//! Pulse interpretation, the control mode engine, fleet coordination, ramping
//! and the loop that ties them to the motor and peer bus.

pub mod config;
pub mod control_loop;
pub mod cruise;
pub mod engine;
pub mod fleet;
pub mod math;
pub mod pulse;
pub mod ramp;
pub mod reverse;
pub mod safe_start;
pub mod shared;
pub mod traction;

pub use config::{ControlMode, CruiseStatus, PpmConfig, ThrottleCurveMode, TractionConfig};
pub use control_loop::{wake_period_ms, Cycle, PpmLoop};
pub use engine::{Command, Decision, Engine, ModeState};
pub use fleet::FleetSnapshot;
pub use ramp::RampState;
pub use safe_start::{SafeStartGate, MIN_PULSES_WITHOUT_POWER};
pub use shared::PpmShared;
