//! Drone controller: the two-phase command admission layer, and the
//! `DroneSdk` facade built on top of it.

use std::collections::VecDeque;
use std::sync::Arc;

use drone_sdk_icd::{
    CommandStatus, CurrentMission, FacadeStatus, FlightController, FlightControllerStatus,
    FlightState, GpsSensor, Location, RadioLink, SafetyState, SignalQuality,
};

use crate::command_controller::CommandController;
use crate::hardware_monitor::{HardwareMonitor, MonitorConfig};
use crate::manager::StateMachineManager;
use crate::pubsub::Subscription;

/// Construction-time parameters for a [`DroneController`].
#[derive(Debug, Clone, Copy)]
pub struct DroneConfig {
    /// Home base location. Used as the `Home` mission destination and as
    /// the altitude floor for emergency descents.
    pub home: Location,
    /// Hardware monitor polling parameters.
    pub monitor: MonitorConfig,
}

impl Default for DroneConfig {
    fn default() -> Self {
        Self {
            home: Location::ORIGIN,
            monitor: MonitorConfig::default(),
        }
    }
}

/// Owns the state machine manager, the command controller, and the
/// hardware monitor, and exposes the client-facing command surface as a
/// transactional two-step: admit to the state machine, then actuate via the
/// controller. A failure at either stage short-circuits the call.
pub struct DroneController<G: GpsSensor + 'static, L: RadioLink + 'static, F: FlightController> {
    manager: Arc<StateMachineManager>,
    controller: Arc<CommandController<F>>,
    monitor: HardwareMonitor<G, L>,
    _wiring: Vec<Subscription>,
}

impl<G: GpsSensor + 'static, L: RadioLink + 'static, F: FlightController + 'static>
    DroneController<G, L, F>
{
    /// Construct and start a drone controller: wires the command controller
    /// to the manager's destination and command-state streams, then starts
    /// the hardware monitor polling loop.
    pub fn new(gps: G, link: L, flight_controller: F, config: DroneConfig) -> Self {
        let manager = Arc::new(StateMachineManager::new());
        manager.set_home(config.home);

        let controller = Arc::new(CommandController::new(flight_controller));

        let wiring = vec![
            {
                let controller = Arc::clone(&controller);
                // Only destination changes the command state machine makes on
                // its own (PATH waypoint advance, safety-abort descent) are
                // wired here: the destination an admitted mission *starts*
                // with is already actuated by the explicit two-phase
                // admit-then-execute call below, so re-actuating it here would
                // send every command to the facade twice.
                manager.subscribe_reactuate(move |loc| {
                    let status = controller.handle_destination_change(loc);
                    if status != FlightControllerStatus::Success {
                        log::warn!("drone controller: destination actuation failed: {status:?}");
                    }
                })
            },
            {
                let controller = Arc::clone(&controller);
                manager.subscribe_command_state(move |status| {
                    controller.handle_command_state(status);
                })
            },
        ];

        let monitor = HardwareMonitor::new(gps, link, Arc::clone(&manager), config.monitor);
        monitor.start();

        Self {
            manager,
            controller,
            monitor,
            _wiring: wiring,
        }
    }

    /// Fly directly to `location`.
    pub fn go_to(&self, location: Location) -> FlightControllerStatus {
        let admitted = self.manager.new_task(CurrentMission::Goto, Some(location), None);
        if admitted != FlightControllerStatus::Success {
            return admitted;
        }
        self.controller.go_to(location)
    }

    /// Fly a sequence of waypoints in order.
    pub fn path(&self, waypoints: VecDeque<Location>) -> FlightControllerStatus {
        let Some(&first) = waypoints.front() else {
            return FlightControllerStatus::InvalidCommand;
        };
        let admitted = self.manager.new_task(CurrentMission::Path, None, Some(waypoints));
        if admitted != FlightControllerStatus::Success {
            return admitted;
        }
        self.controller.path(first)
    }

    /// Hold the current position.
    pub fn hover(&self) -> FlightControllerStatus {
        let admitted = self.manager.new_task(CurrentMission::Hover, None, None);
        if admitted != FlightControllerStatus::Success {
            return admitted;
        }
        self.controller.hover(self.manager.current_destination())
    }

    /// Abort the active mission and return home.
    pub fn abort_mission(&self) -> FlightControllerStatus {
        let admitted = self.manager.new_task(CurrentMission::Home, None, None);
        if admitted != FlightControllerStatus::Success {
            return admitted;
        }
        self.controller.abort_mission()
    }

    /// Stop the hardware monitor. Idempotent; also runs on drop. Logs and
    /// swallows a stop failure rather than propagating it: a shutdown call
    /// has nothing useful to do with a poisoned lock or a dead monitor
    /// thread besides report it.
    pub fn shutdown(&self) {
        if let Err(err) = self.monitor.stop() {
            log::error!("drone controller: hardware monitor stop failed: {err}");
        }
    }

    /// Subscribe to GPS safety-track changes.
    pub fn subscribe_gps_signal_state<C>(&self, callback: C) -> Subscription
    where
        C: Fn(SafetyState) + Send + 'static,
    {
        self.manager.subscribe_gps_safety_state(callback)
    }

    /// Subscribe to link safety-track changes.
    pub fn subscribe_link_signal_state<C>(&self, callback: C) -> Subscription
    where
        C: Fn(SafetyState) + Send + 'static,
    {
        self.manager.subscribe_link_safety_state(callback)
    }

    /// Subscribe to raw GPS location + quality samples.
    pub fn subscribe_gps_location<C>(&self, callback: C) -> Subscription
    where
        C: Fn((Location, SignalQuality)) + Send + 'static,
    {
        self.manager.subscribe_gps_location(callback)
    }

    /// Subscribe to raw radio link quality samples.
    pub fn subscribe_link_quality<C>(&self, callback: C) -> Subscription
    where
        C: Fn(SignalQuality) + Send + 'static,
    {
        self.manager.subscribe_link_quality(callback)
    }

    /// Subscribe to flight-state transitions.
    pub fn subscribe_flight_state<C>(&self, callback: C) -> Subscription
    where
        C: Fn(FlightState) + Send + 'static,
    {
        self.manager.subscribe_flight_state(callback)
    }

    /// Subscribe to command lifecycle state changes.
    pub fn subscribe_command_state<C>(&self, callback: C) -> Subscription
    where
        C: Fn(CommandStatus) + Send + 'static,
    {
        self.manager.subscribe_command_state(callback)
    }

    /// Subscribe to path-waypoint-reached events.
    pub fn subscribe_waypoint<C>(&self, callback: C) -> Subscription
    where
        C: Fn(Location) + Send + 'static,
    {
        self.manager.subscribe_waypoint(callback)
    }
}

/// The public SDK entry point: a thin pass-through over [`DroneController`]
/// exposing exactly the client surface and nothing else. An application
/// constructs one of these and holds it for the lifetime of a flight.
pub struct DroneSdk<G: GpsSensor + 'static, L: RadioLink + 'static, F: FlightController> {
    controller: DroneController<G, L, F>,
}

impl<G: GpsSensor + 'static, L: RadioLink + 'static, F: FlightController + 'static> DroneSdk<G, L, F> {
    /// Construct and start the SDK: wires and starts the drone controller.
    pub fn new(gps: G, link: L, flight_controller: F, config: DroneConfig) -> Self {
        Self {
            controller: DroneController::new(gps, link, flight_controller, config),
        }
    }

    /// Fly directly to `location`.
    pub fn go_to(&self, location: Location) -> FlightControllerStatus {
        self.controller.go_to(location)
    }

    /// Fly a sequence of waypoints in order.
    pub fn path(&self, waypoints: VecDeque<Location>) -> FlightControllerStatus {
        self.controller.path(waypoints)
    }

    /// Hold the current position.
    pub fn hover(&self) -> FlightControllerStatus {
        self.controller.hover()
    }

    /// Abort the active mission and return home.
    pub fn abort_mission(&self) -> FlightControllerStatus {
        self.controller.abort_mission()
    }

    /// Stop the underlying hardware monitor.
    pub fn shutdown(&self) {
        self.controller.shutdown();
    }

    /// Subscribe to GPS safety-track changes.
    pub fn subscribe_gps_signal_state<C>(&self, callback: C) -> Subscription
    where
        C: Fn(SafetyState) + Send + 'static,
    {
        self.controller.subscribe_gps_signal_state(callback)
    }

    /// Subscribe to link safety-track changes.
    pub fn subscribe_link_signal_state<C>(&self, callback: C) -> Subscription
    where
        C: Fn(SafetyState) + Send + 'static,
    {
        self.controller.subscribe_link_signal_state(callback)
    }

    /// Subscribe to raw GPS location + quality samples.
    pub fn subscribe_gps_location<C>(&self, callback: C) -> Subscription
    where
        C: Fn((Location, SignalQuality)) + Send + 'static,
    {
        self.controller.subscribe_gps_location(callback)
    }

    /// Subscribe to raw radio link quality samples.
    pub fn subscribe_link_quality<C>(&self, callback: C) -> Subscription
    where
        C: Fn(SignalQuality) + Send + 'static,
    {
        self.controller.subscribe_link_quality(callback)
    }

    /// Subscribe to flight-state transitions.
    pub fn subscribe_flight_state<C>(&self, callback: C) -> Subscription
    where
        C: Fn(FlightState) + Send + 'static,
    {
        self.controller.subscribe_flight_state(callback)
    }

    /// Subscribe to command lifecycle state changes.
    pub fn subscribe_command_state<C>(&self, callback: C) -> Subscription
    where
        C: Fn(CommandStatus) + Send + 'static,
    {
        self.controller.subscribe_command_state(callback)
    }

    /// Subscribe to path-waypoint-reached events.
    pub fn subscribe_waypoint<C>(&self, callback: C) -> Subscription
    where
        C: Fn(Location) + Send + 'static,
    {
        self.controller.subscribe_waypoint(callback)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    struct FixedGps {
        location: Mutex<Location>,
    }
    impl GpsSensor for FixedGps {
        fn location(&self) -> Location {
            *self.location.lock().unwrap()
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

    struct NoOpFlightController;
    impl FlightController for NoOpFlightController {
        fn arm(&mut self) -> FacadeStatus {
            FacadeStatus::Success
        }
        fn disarm(&mut self) -> FacadeStatus {
            FacadeStatus::Success
        }
        fn take_off(&mut self, _altitude: f64) -> FacadeStatus {
            FacadeStatus::Success
        }
        fn land(&mut self) -> FacadeStatus {
            FacadeStatus::Success
        }
        fn go_home(&mut self) -> FacadeStatus {
            FacadeStatus::Success
        }
        fn go_to(&mut self, _location: Location) -> FacadeStatus {
            FacadeStatus::Success
        }
    }

    #[test]
    fn rejects_invalid_command_without_admitting() {
        let sdk = DroneSdk::new(
            FixedGps {
                location: Mutex::new(Location::ORIGIN),
            },
            FixedLink,
            NoOpFlightController,
            DroneConfig {
                monitor: MonitorConfig {
                    poll_interval: Duration::from_millis(5),
                },
                ..DroneConfig::default()
            },
        );

        let status = sdk.path(VecDeque::new());
        assert_eq!(status, FlightControllerStatus::InvalidCommand);

        sdk.shutdown();
    }

    #[test]
    fn go_to_admits_and_actuates() {
        let sdk = DroneSdk::new(
            FixedGps {
                location: Mutex::new(Location::ORIGIN),
            },
            FixedLink,
            NoOpFlightController,
            DroneConfig {
                monitor: MonitorConfig {
                    poll_interval: Duration::from_millis(5),
                },
                ..DroneConfig::default()
            },
        );

        let status = sdk.go_to(Location::new(1.0, 2.0, 50.0));
        assert_eq!(status, FlightControllerStatus::Success);

        sdk.shutdown();
    }

    struct CountingFlightController {
        go_to_calls: Arc<std::sync::atomic::AtomicUsize>,
    }
    impl FlightController for CountingFlightController {
        fn arm(&mut self) -> FacadeStatus {
            FacadeStatus::Success
        }
        fn disarm(&mut self) -> FacadeStatus {
            FacadeStatus::Success
        }
        fn take_off(&mut self, _altitude: f64) -> FacadeStatus {
            FacadeStatus::Success
        }
        fn land(&mut self) -> FacadeStatus {
            FacadeStatus::Success
        }
        fn go_home(&mut self) -> FacadeStatus {
            FacadeStatus::Success
        }
        fn go_to(&mut self, _location: Location) -> FacadeStatus {
            self.go_to_calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            FacadeStatus::Success
        }
    }

    #[test]
    fn go_to_actuates_the_facade_exactly_once() {
        let go_to_calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let sdk = DroneSdk::new(
            FixedGps {
                location: Mutex::new(Location::ORIGIN),
            },
            FixedLink,
            CountingFlightController {
                go_to_calls: Arc::clone(&go_to_calls),
            },
            DroneConfig {
                monitor: MonitorConfig {
                    poll_interval: Duration::from_millis(5),
                },
                ..DroneConfig::default()
            },
        );

        let status = sdk.go_to(Location::new(1.0, 2.0, 50.0));
        assert_eq!(status, FlightControllerStatus::Success);
        assert_eq!(go_to_calls.load(std::sync::atomic::Ordering::SeqCst), 1);

        sdk.shutdown();
    }

    /// A GPS sensor whose reported location is set by the test thread
    /// rather than advanced on a script, so a test can move it to a
    /// waypoint only after confirming admission's own actuation already
    /// happened — ruling out a race with the polling thread.
    struct SteppingGps {
        location: Arc<Mutex<Location>>,
    }
    impl GpsSensor for SteppingGps {
        fn location(&self) -> Location {
            *self.location.lock().unwrap()
        }
        fn signal_quality(&self) -> SignalQuality {
            SignalQuality::Excellent
        }
    }

    #[test]
    fn path_mission_actuates_each_waypoint_exactly_once() {
        let go_to_calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let location = Arc::new(Mutex::new(Location::ORIGIN));
        let sdk = DroneSdk::new(
            SteppingGps {
                location: Arc::clone(&location),
            },
            FixedLink,
            CountingFlightController {
                go_to_calls: Arc::clone(&go_to_calls),
            },
            DroneConfig {
                monitor: MonitorConfig {
                    poll_interval: Duration::from_millis(5),
                },
                ..DroneConfig::default()
            },
        );

        let waypoints = VecDeque::from(vec![
            Location::new(1.0, 1.0, 1.0),
            Location::new(2.0, 2.0, 2.0),
        ]);
        let status = sdk.path(waypoints);
        assert_eq!(status, FlightControllerStatus::Success);
        // Admission's own first waypoint is actuated once by the explicit
        // `path()` call.
        assert_eq!(go_to_calls.load(std::sync::atomic::Ordering::SeqCst), 1);

        // Drive the GPS to the first waypoint so the command state machine
        // advances the destination to the second one; that destination
        // change has no paired explicit call, so the second `go_to` can
        // only come from the reactuate wiring.
        *location.lock().unwrap() = Location::new(1.0, 1.0, 1.0);
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(go_to_calls.load(std::sync::atomic::Ordering::SeqCst), 2);

        sdk.shutdown();
    }
}
