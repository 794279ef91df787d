//! Firmware-side trait implementations.
//!
//! ```text
//!        pulse_drive_core traits          firmware
//!   ┌──────────────────────────┐   ┌─────────────────────────┐
//!   │ TimeSource  (MockTime)   │──▶│ EmbassyTime             │
//!   └──────────────────────────┘   │ SharedState<T>          │
//!                                  │  EmbassyState / Mock    │
//!                                  └─────────────────────────┘
//! ```

pub mod sync;
pub mod time;

#[cfg(feature = "embassy")]
pub use sync::EmbassyState;
pub use sync::{MockState, SharedState};
#[cfg(feature = "embassy")]
pub use time::EmbassyTime;
pub use time::{MockTime, TimeSource};
