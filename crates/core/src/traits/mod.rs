//! Collaborator traits for the platform-agnostic control logic.
//!
//! The control loop, watchdog and relay never touch hardware directly. Each
//! collaborator is a trait taking `&self` so a single driver instance can be
//! shared between tasks.
//!
//! # Design
//!
//! - Trait definitions are pure and have no feature gates
//! - Mock implementations are always available for host testing
//! - Platform implementations (Embassy) live in the firmware crate

pub mod bus;
pub mod decoder;
pub mod motor;
pub mod relay;
pub mod time;

pub use bus::{BusError, MockBus, PeerBus, PeerMessage, PeerStatus, MAX_PEERS, MAX_PEER_AGE_MS};
pub use decoder::{MockDecoder, PulseDecoder, PulseWindow};
pub use motor::{FaultCode, MockMotor, MotorCommand, MotorError, MotorInterface, MotorLimits};
pub use relay::{MockRelay, RelayOutput};
pub use time::{MockTime, TimeSource};
