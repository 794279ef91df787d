//! Periodic wake for the control loop
//!
//! Wakes the loop every 1 ms (2 ms on the secondary channel) so timeouts and
//! ramps advance even when no pulses arrive. Paused while the transmission
//! relay switches.

use embassy_time::{Duration, Ticker};
use pulse_drive_core::ppm::wake_period_ms;

use crate::app::service::{PPM_SHARED, PPM_WAKE};

#[embassy_executor::task]
pub async fn tick_task() {
    let mut period_ms = wake_period_ms(PPM_SHARED.mode());
    let mut ticker = Ticker::every(Duration::from_millis(period_ms));
    crate::log_debug!("PPM tick started ({} ms)", period_ms);

    loop {
        ticker.next().await;

        let wanted = wake_period_ms(PPM_SHARED.mode());
        if wanted != period_ms {
            period_ms = wanted;
            ticker = Ticker::every(Duration::from_millis(period_ms));
            crate::log_debug!("PPM tick period now {} ms", period_ms);
        }

        if PPM_SHARED.is_running() && !PPM_SHARED.tick_paused() {
            PPM_WAKE.signal(());
        }
    }
}
