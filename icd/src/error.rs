//! Infrastructural error type for the drone SDK.
//!
//! This is deliberately narrow. Domain-level command failures (bad
//! arguments, a facade reporting a hardware fault, and so on) are conveyed
//! through [`crate::types::FlightControllerStatus`] return values, not
//! through this enum. `DroneSdkError` only covers failures that indicate a
//! bug or an unrecoverable host condition: a poisoned lock, a monitor thread
//! that failed to join, or a facade status code nobody taught this SDK
//! about.

use thiserror::Error;

/// Result alias for the infrastructural error channel.
pub type Result<T> = core::result::Result<T, DroneSdkError>;

/// Infrastructural failures surfaced by the coordination engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DroneSdkError {
    /// A `Mutex` guarding a state machine or controller was poisoned by an
    /// earlier panic while a lock was held.
    #[error("{component} lock was poisoned by a prior panic")]
    LockPoisoned {
        /// Name of the component whose lock was poisoned.
        component: &'static str,
    },

    /// The hardware monitor's polling thread did not join cleanly on stop.
    #[error("hardware monitor thread failed to join")]
    MonitorJoinFailed,

    /// The flight-controller facade returned a status code this SDK does
    /// not recognize.
    #[error("flight controller facade returned an unmapped status code: {status}")]
    UnmappedFacadeStatus {
        /// Debug rendering of the raw [`crate::FacadeStatus`] the facade
        /// returned.
        status: String,
    },
}
