//! Coordination engine for the drone application SDK.
//!
//! This crate implements the three cooperating state machines (safety,
//! command, flight), the manager that wires them together, the thin
//! actuator that turns command intents into flight-controller primitives,
//! the hardware polling loop, and the two-phase command admission layer
//! the public SDK facade is built on. It depends only on the data model and
//! hardware-facade traits in `drone_sdk_icd`; it never talks to real
//! hardware directly.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

mod command_controller;
mod command_state_machine;
mod drone_controller;
mod flight_state_machine;
mod hardware_monitor;
mod manager;
mod pubsub;
mod safety_state_machine;

pub use command_controller::CommandController;
pub use command_state_machine::CommandStateMachine;
pub use drone_controller::{DroneConfig, DroneController, DroneSdk};
pub use flight_state_machine::FlightStateMachine;
pub use hardware_monitor::{HardwareMonitor, MonitorConfig};
pub use manager::StateMachineManager;
pub use pubsub::{Subscribers, Subscription};
pub use safety_state_machine::SafetyStateMachine;
