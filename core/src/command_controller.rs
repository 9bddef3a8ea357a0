//! Command controller: the thin actuator between the command state machine's
//! intents and the flight-controller hardware facade.
//!
//! This is the only component in the crate that calls the flight-controller
//! facade directly. It tracks two pieces of state the facade itself does
//! not expose — whether the drone is currently on the ground, and whether a
//! path mission is in progress — purely so it knows when a `go_to` needs a
//! take-off sequence spliced in front of it. It is also the one place in the
//! tree that performs the facade-status-to-domain-status mapping: every
//! method returns [`FlightControllerStatus`], never the narrower
//! [`FacadeStatus`] the trait itself deals in.

use std::sync::Mutex;

use drone_sdk_icd::{
    CommandStatus, DroneSdkError, FacadeStatus, FlightController, FlightControllerStatus, Location,
};

/// Map a raw facade status onto the domain-level status the rest of the
/// engine deals in. The wildcard arm exists because [`FacadeStatus`] is
/// `#[non_exhaustive]`: a facade implementation may report a code this SDK
/// version doesn't recognize, mirroring `flight_controller_handler.hpp`'s
/// `executeCommand` switch and its `default:` arm.
fn map_status(raw: FacadeStatus) -> FlightControllerStatus {
    match raw {
        FacadeStatus::Success => FlightControllerStatus::Success,
        FacadeStatus::ConnectionError => FlightControllerStatus::ConnectionError,
        FacadeStatus::HardwareError => FlightControllerStatus::HardwareError,
        FacadeStatus::InvalidCommand => FlightControllerStatus::InvalidCommand,
        other => {
            let err = DroneSdkError::UnmappedFacadeStatus {
                status: format!("{other:?}"),
            };
            log::error!("command controller: {err}");
            FlightControllerStatus::UnknownError
        }
    }
}

struct Inner {
    on_land: bool,
    on_path: bool,
}

/// Actuates a [`FlightController`] facade on behalf of the command state
/// machine.
pub struct CommandController<F: FlightController> {
    facade: Mutex<F>,
    inner: Mutex<Inner>,
}

impl<F: FlightController> CommandController<F> {
    /// Construct a controller around a facade. Starts assuming the drone is
    /// on the ground, matching the flight state machine's `Landed` initial
    /// state.
    pub fn new(facade: F) -> Self {
        Self {
            facade: Mutex::new(facade),
            inner: Mutex::new(Inner {
                on_land: true,
                on_path: false,
            }),
        }
    }

    /// Arm and take off to `altitude`, then mark the drone airborne.
    pub fn taking_off(&self, target: Location) -> FlightControllerStatus {
        let mut facade = self.facade.lock().unwrap_or_else(|e| e.into_inner());
        let status = map_status(facade.arm());
        if status != FlightControllerStatus::Success {
            log::warn!("command controller: arm failed: {status:?}");
            return status;
        }
        let status = map_status(facade.take_off(target.altitude));
        if status == FlightControllerStatus::Success {
            self.inner.lock().unwrap_or_else(|e| e.into_inner()).on_land = false;
        } else {
            log::warn!("command controller: take_off failed: {status:?}");
        }
        status
    }

    /// Fly to `location`, taking off first if currently on the ground.
    pub fn go_to(&self, location: Location) -> FlightControllerStatus {
        let on_land = self.inner.lock().unwrap_or_else(|e| e.into_inner()).on_land;
        if on_land {
            let status = self.taking_off(location);
            if status != FlightControllerStatus::Success {
                return status;
            }
        }
        map_status(
            self.facade
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .go_to(location),
        )
    }

    /// Abort the active mission by flying directly home.
    pub fn abort_mission(&self) -> FlightControllerStatus {
        map_status(
            self.facade
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .go_home(),
        )
    }

    /// Hold position at `current_location`.
    pub fn hover(&self, current_location: Location) -> FlightControllerStatus {
        map_status(
            self.facade
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .go_to(current_location),
        )
    }

    /// Begin a path mission at its first waypoint.
    pub fn path(&self, first_point: Location) -> FlightControllerStatus {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).on_path = true;
        map_status(
            self.facade
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .go_to(first_point),
        )
    }

    /// React to the command state machine's destination changing.
    pub fn handle_destination_change(&self, location: Location) -> FlightControllerStatus {
        map_status(
            self.facade
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .go_to(location),
        )
    }

    /// React to the command state machine's lifecycle status changing.
    pub fn handle_command_state(&self, status: CommandStatus) {
        match status {
            CommandStatus::MissionAbort => {
                let result = map_status(self.facade.lock().unwrap_or_else(|e| e.into_inner()).land());
                if result == FlightControllerStatus::Success {
                    self.inner.lock().unwrap_or_else(|e| e.into_inner()).on_land = true;
                } else {
                    log::warn!("command controller: emergency land failed: {result:?}");
                }
            }
            CommandStatus::Idle => {
                let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
                if inner.on_path {
                    inner.on_path = false;
                }
            }
            CommandStatus::Busy => {}
        }
    }

    /// Whether the controller currently believes the drone is on the
    /// ground. Exposed for tests and diagnostics.
    pub fn is_on_land(&self) -> bool {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).on_land
    }
}
