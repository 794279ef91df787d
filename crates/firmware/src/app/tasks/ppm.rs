//! Control loop task
//!
//! Runs one loop cycle per wake event until a stop is requested. Pending
//! configuration is applied before the cycle it was posted ahead of.

use pulse_drive_core::ppm::Cycle;
use pulse_drive_core::traits::FaultCode;

use crate::app::service::{PPM_CONFIG, PPM_LOOP, PPM_SHARED, PPM_STOPPED, PPM_WAKE, WATCHDOG};

#[embassy_executor::task]
pub async fn ppm_task() {
    let mut slot = PPM_LOOP.lock().await;
    let Some(ppm) = slot.as_mut() else {
        crate::log_error!("PPM loop started without a loop instance");
        PPM_SHARED.set_running(false);
        PPM_STOPPED.signal(());
        return;
    };

    crate::log_info!("PPM loop started ({})", ppm.config().mode.name());
    let mut fault: Option<FaultCode> = None;

    loop {
        PPM_WAKE.wait().await;

        if let Some(config) = PPM_CONFIG.take() {
            crate::log_info!("PPM configuration applied ({})", config.mode.name());
            ppm.configure(config, &PPM_SHARED);
        }

        match ppm.step(&PPM_SHARED, &WATCHDOG) {
            Ok(Cycle::Stopped) => break,
            Ok(Cycle::Fault(code)) => {
                if fault != Some(code) {
                    crate::log_warn!("Motor fault: {}", code.name());
                    fault = Some(code);
                }
            }
            Ok(cycle) => {
                if fault.take().is_some() {
                    crate::log_info!("Motor fault cleared");
                }
                if cycle == (Cycle::TimedOut { edge: true }) {
                    crate::log_warn!("PPM signal lost");
                }
            }
            Err(e) => {
                // Keep running; the next cycle retries
                crate::log_error!("PPM dispatch failed: {}", e.name());
            }
        }
    }

    drop(slot);
    crate::log_info!("PPM loop stopped");
    PPM_STOPPED.signal(());
}
