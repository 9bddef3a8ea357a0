//! Core value types shared by every crate in the workspace.
//!
//! These are the nouns the three state machines, the manager, and the
//! controllers pass back and forth. All are small, `Copy`-friendly value
//! types; none own a lock, a thread, or any other resource.

use serde::{Deserialize, Serialize};

/// A point in space: latitude, longitude, and altitude.
///
/// Equality is exact, component-wise `f64` comparison — the drone is
/// considered "at" its destination only when the telemetry sample matches
/// bit-for-bit. A production system would likely want a configurable
/// epsilon here; arrival detection in this crate deliberately does not
/// introduce one, since that would silently change which samples count as
/// "arrived".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Altitude in meters.
    pub altitude: f64,
}

impl Location {
    /// Construct a location from its three components.
    pub const fn new(latitude: f64, longitude: f64, altitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude,
        }
    }

    /// The origin, `(0, 0, 0)` — the default home base.
    pub const ORIGIN: Self = Self::new(0.0, 0.0, 0.0);

    /// This location with its altitude replaced.
    pub const fn with_altitude(self, altitude: f64) -> Self {
        Self { altitude, ..self }
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::ORIGIN
    }
}

/// Signal quality as reported by the GPS sensor or the radio link.
///
/// Ordered from worst to best. Only [`SignalQuality::NoSignal`] is treated
/// as "bad" anywhere in the safety state machine; every other variant is
/// treated identically as "good".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SignalQuality {
    /// No signal at all — triggers safety degradation.
    NoSignal = 0,
    /// Poor but present signal.
    Poor = 1,
    /// Fair signal.
    Fair = 2,
    /// Good signal.
    Good = 3,
    /// Excellent signal.
    Excellent = 4,
}

impl SignalQuality {
    /// Whether this quality sample should be treated as a signal loss.
    pub const fn is_lost(self) -> bool {
        matches!(self, Self::NoSignal)
    }
}

/// One track's health classification in the safety state machine.
///
/// The GPS track and the link track each hold one of these independently;
/// both start in the "good" variant and degrade one-way on the first lost
/// sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SafetyState {
    /// GPS signal is healthy.
    GpsHealthy,
    /// GPS signal has been lost at least once; stays degraded.
    GpsNotHealthy,
    /// Radio link is connected.
    Connected,
    /// Radio link has been lost at least once; stays degraded.
    NotConnected,
}

/// Physical flight phase, owned by the flight state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlightState {
    /// On the ground, rotors off.
    Landed,
    /// Ascending after an arm + take-off sequence.
    Takeoff,
    /// Airborne and moving toward a destination.
    Airborne,
    /// Airborne and holding position.
    Hover,
    /// Safety sink: descending to home altitude in place.
    EmergencyLand,
    /// Airborne and returning to home base.
    ReturnHome,
}

/// The client-level mission intent currently owned by the command state
/// machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CurrentMission {
    /// No mission; drone is on the ground.
    Landed,
    /// Fly directly to a single destination.
    Goto,
    /// Fly a sequence of waypoints.
    Path,
    /// Hold the current position.
    Hover,
    /// Return to home base.
    Home,
    /// Safety-triggered descent to home altitude at the current position.
    Emergency,
}

/// Lifecycle state of the currently-owned mission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandStatus {
    /// No mission in progress; ready to accept a new one.
    Idle,
    /// A mission is in progress.
    Busy,
    /// A mission was aborted for safety reasons and is descending home.
    MissionAbort,
}

/// Raw status code returned directly by a [`crate::facade::FlightController`]
/// primitive.
///
/// Narrower than [`FlightControllerStatus`] on purpose: the hardware facade
/// boundary can only report what the hardware itself knows how to report,
/// never the domain-level outcomes (`EmergencyLand`, `MissionAbort`, ...)
/// that only the command state machine can derive. `command_controller`'s
/// mapping step is what turns one of these into the richer
/// `FlightControllerStatus` the rest of the engine deals in.
///
/// Marked `#[non_exhaustive]`: a facade implementation is free to report a
/// code this SDK version doesn't yet recognize, and every downstream match
/// is required to carry a fallback arm for it — the same shape as
/// `flight_controller_handler.hpp`'s `executeCommand` switch, whose
/// `default:` arm maps an unrecognized `ResponseCode` to "unknown error"
/// rather than refusing to compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum FacadeStatus {
    /// The primitive completed successfully.
    Success,
    /// The facade reported a connection failure.
    ConnectionError,
    /// The facade reported a hardware failure.
    HardwareError,
    /// The facade rejected the request as invalid (e.g. `take_off` without
    /// a prior `arm`).
    InvalidCommand,
}

/// Result code returned by every flight-controller primitive and every
/// public SDK command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlightControllerStatus {
    /// The operation completed successfully.
    Success,
    /// The drone is performing an emergency landing.
    EmergencyLand,
    /// The drone is performing an emergency return-home.
    EmergencyGoHome,
    /// The active mission was aborted for safety reasons.
    EmergencyAbortedMission,
    /// The facade reported a connection failure.
    ConnectionError,
    /// The facade reported a hardware failure.
    HardwareError,
    /// The request was rejected: bad arguments or an invalid state transition.
    InvalidCommand,
    /// The facade returned a status this SDK does not recognize.
    UnknownError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_equality_is_exact() {
        let a = Location::new(10.0, 20.0, 100.0);
        let b = Location::new(10.0, 20.0, 100.0 + f64::EPSILON);
        assert_ne!(a, b, "arrival detection relies on bit-exact equality");
    }

    #[test]
    fn signal_quality_ordering() {
        assert!(SignalQuality::NoSignal < SignalQuality::Poor);
        assert!(SignalQuality::Poor < SignalQuality::Excellent);
    }

    #[test]
    fn only_no_signal_is_lost() {
        assert!(SignalQuality::NoSignal.is_lost());
        for q in [
            SignalQuality::Poor,
            SignalQuality::Fair,
            SignalQuality::Good,
            SignalQuality::Excellent,
        ] {
            assert!(!q.is_lost());
        }
    }

    #[test]
    fn default_location_is_origin() {
        assert_eq!(Location::default(), Location::ORIGIN);
    }
}
