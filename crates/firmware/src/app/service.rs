//! Start, stop and configure the PPM application
//!
//! Board code installs its drivers once with [`install`], then starts the
//! watchdog, the control loop and (optionally) the transmission relay. The
//! decode interrupt reports every sample through [`on_pulse_decoded`].

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_executor::Spawner;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_sync::signal::Signal;
use embassy_time::{with_timeout, Duration};

use pulse_drive_core::parameters::{
    ParamGroup, ParameterStore, PpmParams, TimeoutParams, TransmissionParams,
};
use pulse_drive_core::ppm::{PpmConfig, PpmLoop, PpmShared};
use pulse_drive_core::traits::{MotorInterface, PeerBus, PulseDecoder, RelayOutput, TimeSource};
use pulse_drive_core::watchdog::WatchdogShared;

use super::mailbox::Mailbox;
use super::tasks;
use crate::core::traits::{EmbassyState, EmbassyTime, SharedState};

pub type Motor = &'static (dyn MotorInterface + Sync);
pub type Bus = &'static (dyn PeerBus + Sync);
pub type Decoder = &'static (dyn PulseDecoder + Sync);
pub type Relay = &'static (dyn RelayOutput + Sync);

/// Control loop with the installed drivers
pub type Loop = PpmLoop<Motor, Bus, Decoder, EmbassyTime>;

/// Upper bound on waiting for the loop to acknowledge a stop (ms)
pub const STOP_TIMEOUT_MS: u64 = 100;

/// Driver handles shared by all tasks
#[derive(Clone, Copy)]
pub struct Drivers {
    pub motor: Motor,
    pub bus: Bus,
    pub decoder: Decoder,
    pub relay: Relay,
}

/// Application lifecycle errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppError {
    /// [`install`] has not been called
    NotInstalled,
    /// The task is already running
    AlreadyRunning,
    /// The executor has no room for the task
    Spawn,
}

impl AppError {
    pub fn name(self) -> &'static str {
        match self {
            AppError::NotInstalled => "NotInstalled",
            AppError::AlreadyRunning => "AlreadyRunning",
            AppError::Spawn => "Spawn",
        }
    }
}

impl core::fmt::Display for AppError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            AppError::NotInstalled => write!(f, "drivers not installed"),
            AppError::AlreadyRunning => write!(f, "already running"),
            AppError::Spawn => write!(f, "task spawn failed"),
        }
    }
}

static DRIVERS: EmbassyState<Option<Drivers>> = EmbassyState::new(None);

pub(crate) static WATCHDOG: WatchdogShared = WatchdogShared::new();
pub(crate) static PPM_SHARED: PpmShared = PpmShared::new();

/// Raised by the decode interrupt and the periodic tick
pub(crate) static PPM_WAKE: Signal<CriticalSectionRawMutex, ()> = Signal::new();
/// Raised by the loop task right before it exits
pub(crate) static PPM_STOPPED: Signal<CriticalSectionRawMutex, ()> = Signal::new();
/// Held by the loop task for as long as it runs
pub(crate) static PPM_LOOP: Mutex<CriticalSectionRawMutex, Option<Loop>> = Mutex::new(None);
pub(crate) static PPM_CONFIG: Mailbox<PpmConfig, EmbassyState<Option<PpmConfig>>> =
    Mailbox::new(EmbassyState::new(None));

pub(crate) static TX_SWITCH_ERPM: Mailbox<f32, EmbassyState<Option<f32>>> =
    Mailbox::new(EmbassyState::new(None));
pub(crate) static TX_STOP: Signal<CriticalSectionRawMutex, ()> = Signal::new();

static TICK_SPAWNED: AtomicBool = AtomicBool::new(false);

/// Register the drivers used by every task
pub fn install(drivers: Drivers) {
    DRIVERS.with_mut(|slot| *slot = Some(drivers));
}

fn drivers() -> Result<Drivers, AppError> {
    DRIVERS.with(|slot| *slot).ok_or(AppError::NotInstalled)
}

/// Start the timeout watchdog; it runs for the lifetime of the firmware
pub fn start_watchdog(spawner: &Spawner) -> Result<(), AppError> {
    let drivers = drivers()?;
    spawner
        .spawn(tasks::watchdog_task(drivers.motor))
        .map_err(|_| AppError::AlreadyRunning)
}

/// Set the command timeout and the brake current held while timed out
pub fn configure_timeout(timeout_ms: u32, brake_current: f32) {
    WATCHDOG.configure(timeout_ms, brake_current);
    crate::log_info!(
        "Command timeout set to {} ms (brake {} A)",
        timeout_ms,
        brake_current
    );
}

/// Start the control loop with `config`
///
/// A configuration still queued from before the start is dropped.
pub fn start(spawner: &Spawner, config: PpmConfig) -> Result<(), AppError> {
    let drivers = drivers()?;
    if PPM_SHARED.is_running() {
        return Err(AppError::AlreadyRunning);
    }
    let mut slot = PPM_LOOP.try_lock().map_err(|_| AppError::AlreadyRunning)?;

    if PPM_CONFIG.discard() {
        crate::log_debug!("Queued configuration replaced by start");
    }
    let ppm = slot.get_or_insert_with(|| {
        Loop::new(
            drivers.motor,
            drivers.bus,
            drivers.decoder,
            EmbassyTime,
            config.clone(),
        )
    });
    ppm.configure(config, &PPM_SHARED);
    PPM_STOPPED.reset();
    ppm.start(&PPM_SHARED);
    drop(slot);

    if spawner.spawn(tasks::ppm_task()).is_err() {
        PPM_SHARED.set_running(false);
        drivers.decoder.stop();
        return Err(AppError::Spawn);
    }

    if !TICK_SPAWNED.load(Ordering::Acquire) {
        spawner
            .spawn(tasks::tick_task())
            .map_err(|_| AppError::Spawn)?;
        TICK_SPAWNED.store(true, Ordering::Release);
    }
    Ok(())
}

/// Stop the control loop and the decoder
///
/// Waits at most [`STOP_TIMEOUT_MS`] for the loop to exit.
pub async fn stop() {
    if PPM_SHARED.is_running() {
        PPM_SHARED.request_stop();
        PPM_WAKE.signal(());
        if with_timeout(Duration::from_millis(STOP_TIMEOUT_MS), PPM_STOPPED.wait())
            .await
            .is_err()
        {
            crate::log_warn!("PPM loop did not stop within {} ms", STOP_TIMEOUT_MS);
        }
    }
    if let Ok(drivers) = drivers() {
        drivers.decoder.stop();
    }
}

/// Queue a configuration; the loop applies it at its next cycle boundary
pub fn configure(config: PpmConfig) {
    PPM_CONFIG.put(config);
    PPM_WAKE.signal(());
}

/// Push the parameter groups changed since the last call
///
/// Returns the groups that were applied.
pub fn apply_parameters(store: &mut ParameterStore) -> ParamGroup {
    let changed = store.take_changed();

    if changed.contains(ParamGroup::PPM) {
        configure(PpmParams::from_store(store).config);
    }
    if changed.contains(ParamGroup::TIMEOUT) {
        let timeout = TimeoutParams::from_store(store);
        configure_timeout(timeout.timeout_ms, timeout.brake_current);
    }
    if changed.contains(ParamGroup::TRANSMISSION) {
        TX_SWITCH_ERPM.put(TransmissionParams::from_store(store).switch_erpm);
    }
    changed
}

/// Last normalized throttle value
pub fn decoded_level() -> f32 {
    PPM_SHARED.decoded_level()
}

/// Decode-completion callback, safe to call from interrupt context
///
/// Returns whether the sample fed the watchdog.
pub fn on_pulse_decoded(valid: bool) -> bool {
    let fed = PPM_SHARED.on_pulse(valid, EmbassyTime.now_ms32(), &WATCHDOG);
    PPM_WAKE.signal(());
    fed
}

/// Start the transmission relay with the given switch point
pub fn start_transmission(spawner: &Spawner, switch_erpm: f32) -> Result<(), AppError> {
    let drivers = drivers()?;
    TX_STOP.reset();
    TX_SWITCH_ERPM.put(switch_erpm);
    spawner
        .spawn(tasks::transmission_task(drivers.motor, drivers.relay))
        .map_err(|_| AppError::AlreadyRunning)
}

/// Stop the transmission relay; the task exits at its next poll
pub fn stop_transmission() {
    TX_STOP.signal(());
}
