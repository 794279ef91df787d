//! Embassy tasks

mod ppm;
mod tick;
mod transmission;
mod watchdog;

pub use ppm::ppm_task;
pub use tick::tick_task;
pub use transmission::transmission_task;
pub use watchdog::watchdog_task;
