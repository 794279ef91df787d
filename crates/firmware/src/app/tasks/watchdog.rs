//! Command timeout watchdog task
//!
//! Free-running every 10 ms. Has no stop path.

use embassy_time::{Duration, Ticker};
use pulse_drive_core::traits::TimeSource;
use pulse_drive_core::watchdog::{TimeoutWatchdog, WatchdogTick, TICK_PERIOD_MS};

use crate::app::service::{Motor, WATCHDOG};
use crate::core::traits::EmbassyTime;

#[embassy_executor::task]
pub async fn watchdog_task(motor: Motor) {
    crate::log_info!("Timeout watchdog started ({} ms)", WATCHDOG.timeout_ms());

    let mut watchdog = TimeoutWatchdog::new();
    let mut ticker = Ticker::every(Duration::from_millis(TICK_PERIOD_MS));
    let mut timed_out = false;

    loop {
        match watchdog.tick(&WATCHDOG, &motor, EmbassyTime.now_ms32()) {
            Ok(WatchdogTick::Armed) => {
                if timed_out {
                    crate::log_info!("Commands resumed, watchdog armed");
                    timed_out = false;
                }
            }
            Ok(WatchdogTick::Ramping { entered, current }) => {
                if entered {
                    crate::log_warn!("Command timeout, ramping from {} A", current);
                }
                timed_out = true;
            }
            Ok(WatchdogTick::Stopped { reached }) => {
                if reached {
                    crate::log_info!("Motor stopped after command timeout");
                }
                timed_out = true;
            }
            Err(e) => crate::log_error!("Watchdog dispatch failed: {}", e.name()),
        }

        ticker.next().await;
    }
}
