//! Hardware facade contracts.
//!
//! The coordination engine never talks to real hardware directly — it is
//! built entirely against these three traits. A production binary wires in
//! real drivers; tests and demos wire in the mocks from the `hw-sim` crate.
//! Every method here is total and non-blocking: the facade never panics and
//! never parks the calling thread, so the Hardware Monitor's poll loop can
//! call it synchronously, once per tick, without a timeout.

use crate::types::{FacadeStatus, Location, SignalQuality};

/// GPS sensor contract: current position and signal quality.
pub trait GpsSensor: Send {
    /// The sensor's current best estimate of the drone's location.
    fn location(&self) -> Location;

    /// The sensor's current signal quality.
    fn signal_quality(&self) -> SignalQuality;
}

/// Radio link contract: signal quality only. The link carries telemetry
/// and commands but exposes no payload to the coordination engine — only
/// its health matters to the safety state machine.
pub trait RadioLink: Send {
    /// The link's current signal quality.
    fn signal_quality(&self) -> SignalQuality;
}

/// Flight controller contract: the physical primitives the command
/// controller actuates.
///
/// Returns [`FacadeStatus`], not `FlightControllerStatus` — the richer
/// domain codes (`EmergencyLand`, `MissionAbort`, `UnknownError`, ...) are
/// derived by `command_controller`'s mapping step, never reported by the
/// facade itself.
pub trait FlightController: Send {
    /// Arm the rotors. Must succeed before `take_off`.
    fn arm(&mut self) -> FacadeStatus;

    /// Disarm the rotors.
    fn disarm(&mut self) -> FacadeStatus;

    /// Take off and climb to `altitude` at the current horizontal position.
    fn take_off(&mut self, altitude: f64) -> FacadeStatus;

    /// Land at the current horizontal position.
    fn land(&mut self) -> FacadeStatus;

    /// Fly directly to home base.
    fn go_home(&mut self) -> FacadeStatus;

    /// Fly directly to `location`.
    fn go_to(&mut self, location: Location) -> FacadeStatus;
}
