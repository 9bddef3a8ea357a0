//! Interface control document for the drone application SDK.
//!
//! This crate defines the data model shared by every other crate in the
//! workspace (locations, signal quality, the safety/flight/command status
//! enums) and the hardware-facade traits the coordination engine is built
//! against: a GPS sensor, a radio link, and a flight controller. Concrete
//! implementations of those traits — real hardware drivers, or the mocks in
//! `hw-sim` — live outside this crate; `icd` only fixes the contract.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![warn(trivial_casts, trivial_numeric_casts)]
#![warn(unused_qualifications)]

pub mod error;
pub mod facade;
pub mod types;

pub use error::{DroneSdkError, Result};
pub use facade::{FlightController, GpsSensor, RadioLink};
pub use types::{
    CommandStatus, CurrentMission, FacadeStatus, FlightControllerStatus, FlightState, Location,
    SafetyState, SignalQuality,
};
