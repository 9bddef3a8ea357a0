//! Mock hardware facades for the drone application SDK.
//!
//! These implementations of `drone_sdk_icd::facade`'s three traits never
//! talk to real hardware; they exist so the coordination engine can be
//! exercised end to end in tests and demo binaries.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

use std::collections::VecDeque;
use std::sync::Mutex;

use drone_sdk_icd::{FacadeStatus, FlightController, GpsSensor, Location, RadioLink, SignalQuality};
use rand::Rng;

/// A GPS sensor that replays a fixed, caller-supplied script of samples,
/// then repeats its last sample forever. Useful for driving deterministic
/// scenarios (a straight-line GOTO, a PATH mission's waypoints, ...).
pub struct ScriptedGps {
    remaining: Mutex<VecDeque<(Location, SignalQuality)>>,
    last: Mutex<(Location, SignalQuality)>,
}

impl ScriptedGps {
    /// Build a scripted sensor from an ordered list of samples. Panics if
    /// `samples` is empty — a script needs at least one sample to have a
    /// steady state to repeat.
    #[must_use]
    pub fn new(samples: Vec<(Location, SignalQuality)>) -> Self {
        assert!(!samples.is_empty(), "ScriptedGps requires at least one sample");
        let remaining: VecDeque<_> = samples.into_iter().collect();
        #[allow(clippy::unwrap_used)]
        let first = *remaining.front().unwrap();
        Self {
            remaining: Mutex::new(remaining),
            last: Mutex::new(first),
        }
    }

    /// Build a sensor that linearly interpolates `steps` samples between
    /// `from` and `to`, all reported at `quality`. Used to drive the long
    /// multi-update GOTO scenario.
    #[must_use]
    pub fn linear_path(from: Location, to: Location, steps: usize, quality: SignalQuality) -> Self {
        assert!(steps >= 1, "linear_path requires at least one step");
        let samples = (0..=steps)
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let t = i as f64 / steps as f64;
                let loc = Location::new(
                    from.latitude + (to.latitude - from.latitude) * t,
                    from.longitude + (to.longitude - from.longitude) * t,
                    from.altitude + (to.altitude - from.altitude) * t,
                );
                (loc, quality)
            })
            .collect();
        Self::new(samples)
    }
}

impl GpsSensor for ScriptedGps {
    // `location()` is the one call that advances the script; `signal_quality()`
    // only reads back whatever `location()` last produced. This relies on
    // callers reading location before quality on a given tick, which is
    // exactly the order the hardware monitor polls in.
    fn location(&self) -> Location {
        self.advance().0
    }

    fn signal_quality(&self) -> SignalQuality {
        (*self.last.lock().unwrap_or_else(|e| e.into_inner())).1
    }
}

impl ScriptedGps {
    fn advance(&self) -> (Location, SignalQuality) {
        let mut remaining = self.remaining.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(sample) = remaining.pop_front() {
            *self.last.lock().unwrap_or_else(|e| e.into_inner()) = sample;
            sample
        } else {
            *self.last.lock().unwrap_or_else(|e| e.into_inner())
        }
    }
}

/// A radio link that replays a fixed script of qualities, then repeats the
/// last one.
pub struct ScriptedLink {
    remaining: Mutex<VecDeque<SignalQuality>>,
    last: Mutex<SignalQuality>,
}

impl ScriptedLink {
    /// Build a scripted link from an ordered list of qualities.
    #[must_use]
    pub fn new(samples: Vec<SignalQuality>) -> Self {
        assert!(!samples.is_empty(), "ScriptedLink requires at least one sample");
        let remaining: VecDeque<_> = samples.into_iter().collect();
        #[allow(clippy::unwrap_used)]
        let first = *remaining.front().unwrap();
        Self {
            remaining: Mutex::new(remaining),
            last: Mutex::new(first),
        }
    }

    /// A link that always reports the same quality.
    #[must_use]
    pub fn steady(quality: SignalQuality) -> Self {
        Self::new(vec![quality])
    }
}

impl RadioLink for ScriptedLink {
    fn signal_quality(&self) -> SignalQuality {
        let mut remaining = self.remaining.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(sample) = remaining.pop_front() {
            *self.last.lock().unwrap_or_else(|e| e.into_inner()) = sample;
            sample
        } else {
            *self.last.lock().unwrap_or_else(|e| e.into_inner())
        }
    }
}

/// A GPS sensor that holds steady at a target location with a small random
/// jitter on each read, for demo binaries that want the telemetry stream to
/// look alive without scripting every sample by hand.
pub struct JitteringGps {
    target: Mutex<Location>,
    jitter: f64,
    quality: SignalQuality,
}

impl JitteringGps {
    /// Construct a sensor centered on `target`, wobbling by up to
    /// `jitter_meters` in latitude/longitude on every read.
    #[must_use]
    pub fn new(target: Location, jitter_meters: f64, quality: SignalQuality) -> Self {
        Self {
            target: Mutex::new(target),
            jitter: jitter_meters,
            quality,
        }
    }

    /// Move the jitter center, e.g. after a demo binary issues a new
    /// command.
    pub fn set_target(&self, target: Location) {
        *self.target.lock().unwrap_or_else(|e| e.into_inner()) = target;
    }
}

impl GpsSensor for JitteringGps {
    fn location(&self) -> Location {
        let target = *self.target.lock().unwrap_or_else(|e| e.into_inner());
        if self.jitter == 0.0 {
            return target;
        }
        let mut rng = rand::thread_rng();
        Location::new(
            target.latitude + rng.gen_range(-self.jitter..=self.jitter),
            target.longitude + rng.gen_range(-self.jitter..=self.jitter),
            target.altitude,
        )
    }

    fn signal_quality(&self) -> SignalQuality {
        self.quality
    }
}

/// A flight controller that logs every actuation and tracks just enough
/// internal state (armed/disarmed) to reject a take-off attempted without
/// arming first, mirroring the kind of misuse a real flight controller
/// would also reject with `InvalidCommand`.
pub struct LoggingFlightController {
    armed: bool,
}

impl LoggingFlightController {
    /// Construct a controller, starting disarmed.
    #[must_use]
    pub fn new() -> Self {
        Self { armed: false }
    }
}

impl Default for LoggingFlightController {
    fn default() -> Self {
        Self::new()
    }
}

impl FlightController for LoggingFlightController {
    fn arm(&mut self) -> FacadeStatus {
        log::info!("hw-sim: arm");
        self.armed = true;
        FacadeStatus::Success
    }

    fn disarm(&mut self) -> FacadeStatus {
        log::info!("hw-sim: disarm");
        self.armed = false;
        FacadeStatus::Success
    }

    fn take_off(&mut self, altitude: f64) -> FacadeStatus {
        if !self.armed {
            log::warn!("hw-sim: take_off rejected, not armed");
            return FacadeStatus::InvalidCommand;
        }
        log::info!("hw-sim: take_off to {altitude}m");
        FacadeStatus::Success
    }

    fn land(&mut self) -> FacadeStatus {
        log::info!("hw-sim: land");
        self.armed = false;
        FacadeStatus::Success
    }

    fn go_home(&mut self) -> FacadeStatus {
        log::info!("hw-sim: go_home");
        FacadeStatus::Success
    }

    fn go_to(&mut self, location: Location) -> FacadeStatus {
        log::info!("hw-sim: go_to {location:?}");
        FacadeStatus::Success
    }
}
