//! Hardware monitor: the ~10 Hz polling loop that feeds GPS and link
//! telemetry from the hardware facade into the rest of the engine.
//!
//! A dedicated worker thread checks a shared running flag each tick, sleeps
//! ~100 ms, and is joined on `stop()` rather than left to drift away on
//! drop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use drone_sdk_icd::{DroneSdkError, GpsSensor, RadioLink};

use crate::manager::StateMachineManager;

/// Construction-time parameters for the hardware monitor.
#[derive(Debug, Clone, Copy)]
pub struct MonitorConfig {
    /// Approximate delay between polls.
    pub poll_interval: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
        }
    }
}

/// Polls a GPS sensor and a radio link on a dedicated worker thread and
/// forwards every sample into a [`StateMachineManager`].
pub struct HardwareMonitor<G: GpsSensor + 'static, L: RadioLink + 'static> {
    gps: Arc<Mutex<G>>,
    link: Arc<Mutex<L>>,
    manager: Arc<StateMachineManager>,
    config: MonitorConfig,
    running: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl<G: GpsSensor + 'static, L: RadioLink + 'static> HardwareMonitor<G, L> {
    /// Construct a monitor. Does not start polling until [`Self::start`] is
    /// called.
    pub fn new(gps: G, link: L, manager: Arc<StateMachineManager>, config: MonitorConfig) -> Self {
        Self {
            gps: Arc::new(Mutex::new(gps)),
            link: Arc::new(Mutex::new(link)),
            manager,
            config,
            running: Arc::new(AtomicBool::new(false)),
            handle: Mutex::new(None),
        }
    }

    /// Start the polling thread. A no-op if already running.
    pub fn start(&self) {
        let mut handle = self.handle.lock().unwrap_or_else(|e| e.into_inner());
        if handle.is_some() {
            return;
        }

        self.running.store(true, Ordering::SeqCst);

        let gps = Arc::clone(&self.gps);
        let link = Arc::clone(&self.link);
        let manager = Arc::clone(&self.manager);
        let running = Arc::clone(&self.running);
        let interval = self.config.poll_interval;

        *handle = Some(thread::spawn(move || {
            log::info!("hardware monitor: polling thread started");
            while running.load(Ordering::SeqCst) {
                let (location, gps_quality) = {
                    let sensor = gps.lock().unwrap_or_else(|e| e.into_inner());
                    (sensor.location(), sensor.signal_quality())
                };
                let link_quality = link.lock().unwrap_or_else(|e| e.into_inner()).signal_quality();

                manager.handle_gps_update(location, gps_quality);
                manager.handle_link_update(link_quality);

                thread::sleep(interval);
            }
            log::info!("hardware monitor: polling thread stopped");
        }));
    }

    /// Stop the polling thread and join it. A no-op if already stopped.
    ///
    /// # Errors
    ///
    /// Returns [`DroneSdkError::LockPoisoned`] if the handle lock was
    /// poisoned by a prior panic, or [`DroneSdkError::MonitorJoinFailed`] if
    /// the polling thread itself panicked and could not be joined cleanly.
    pub fn stop(&self) -> drone_sdk_icd::Result<()> {
        self.running.store(false, Ordering::SeqCst);
        let mut handle = self.handle.lock().map_err(|_| DroneSdkError::LockPoisoned {
            component: "hardware_monitor",
        })?;
        if let Some(h) = handle.take() {
            if h.join().is_err() {
                log::error!("hardware monitor: polling thread panicked");
                return Err(DroneSdkError::MonitorJoinFailed);
            }
        }
        Ok(())
    }

    /// Whether the polling thread is currently running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl<G: GpsSensor + 'static, L: RadioLink + 'static> Drop for HardwareMonitor<G, L> {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            log::error!("hardware monitor: stop on drop failed: {err}");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use drone_sdk_icd::{Location, SignalQuality};

    struct FixedGps;
    impl GpsSensor for FixedGps {
        fn location(&self) -> Location {
            Location::ORIGIN
        }
        fn signal_quality(&self) -> SignalQuality {
            SignalQuality::Excellent
        }
    }

    struct FixedLink;
    impl RadioLink for FixedLink {
        fn signal_quality(&self) -> SignalQuality {
            SignalQuality::Excellent
        }
    }

    #[test]
    fn start_stop_is_idempotent() {
        let manager = Arc::new(StateMachineManager::new());
        let monitor = HardwareMonitor::new(
            FixedGps,
            FixedLink,
            manager,
            MonitorConfig {
                poll_interval: Duration::from_millis(5),
            },
        );

        monitor.start();
        monitor.start();
        assert!(monitor.is_running());

        thread::sleep(Duration::from_millis(20));

        monitor.stop().unwrap();
        monitor.stop().unwrap();
        assert!(!monitor.is_running());
    }
}
