//! Transmission relay task
//!
//! Polls motor speed every 250 ms and shifts when it crosses the switch
//! point. Exits when the relay application is stopped.

use embassy_futures::select::{select, Either};
use embassy_time::{Duration, Ticker, Timer};
use pulse_drive_core::transmission::{TransmissionRelay, DEFAULT_SWITCH_ERPM, POLL_PERIOD_MS, SETTLE_MS};

use crate::app::service::{Motor, Relay, PPM_SHARED, TX_STOP, TX_SWITCH_ERPM};

#[embassy_executor::task]
pub async fn transmission_task(motor: Motor, relay: Relay) {
    let mut transmission = TransmissionRelay::new(DEFAULT_SWITCH_ERPM);
    let mut ticker = Ticker::every(Duration::from_millis(POLL_PERIOD_MS));
    crate::log_info!("Transmission relay started");

    loop {
        if let Some(erpm) = TX_SWITCH_ERPM.take() {
            transmission.configure(erpm);
            crate::log_info!("Transmission switch point {} erpm", erpm);
        }

        if let Some(shift) = transmission.poll(motor.rpm()) {
            crate::log_info!("Transmission shift: {}", shift.name());
            if let Err(e) = TransmissionRelay::apply(shift, &PPM_SHARED, &motor, &relay) {
                crate::log_error!("Current cut before shift failed: {}", e.name());
            }
            Timer::after(Duration::from_millis(SETTLE_MS)).await;
            TransmissionRelay::resume(&PPM_SHARED);
        }

        if let Either::Second(()) = select(ticker.next(), TX_STOP.wait()).await {
            break;
        }
    }

    transmission.stop();
    crate::log_info!("Transmission relay stopped");
}
