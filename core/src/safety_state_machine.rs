//! Safety state machine: classifies GPS and link signal quality into
//! health states with a strict one-way degradation rule.
//!
//! Two tracks are maintained independently. Each starts "healthy" and
//! degrades permanently the first time it observes [`SignalQuality::NoSignal`];
//! no sample after that can restore it, for either track.

use drone_sdk_icd::{SafetyState, SignalQuality};
use std::sync::Mutex;

use crate::pubsub::{Subscribers, Subscription};

/// The safety state machine. Owns the GPS and link tracks and fans out a
/// state-change event whenever either track actually transitions.
pub struct SafetyStateMachine {
    gps_state: Mutex<SafetyState>,
    link_state: Mutex<SafetyState>,
    gps_subscribers: Subscribers<SafetyState>,
    link_subscribers: Subscribers<SafetyState>,
}

impl Default for SafetyStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl SafetyStateMachine {
    /// Construct a new machine with both tracks in their healthy state.
    pub fn new() -> Self {
        Self {
            gps_state: Mutex::new(SafetyState::GpsHealthy),
            link_state: Mutex::new(SafetyState::Connected),
            gps_subscribers: Subscribers::new(),
            link_subscribers: Subscribers::new(),
        }
    }

    /// Feed one GPS signal quality sample.
    pub fn handle_gps_signal(&self, quality: SignalQuality) {
        let mut state = self.gps_state.lock().unwrap_or_else(|e| e.into_inner());
        if *state == SafetyState::GpsHealthy && quality.is_lost() {
            *state = SafetyState::GpsNotHealthy;
            log::warn!("safety: GPS signal lost, track degraded to GpsNotHealthy");
            drop(state);
            self.gps_subscribers.notify(SafetyState::GpsNotHealthy);
        }
    }

    /// Feed one radio link signal quality sample.
    pub fn handle_link_signal(&self, quality: SignalQuality) {
        let mut state = self.link_state.lock().unwrap_or_else(|e| e.into_inner());
        if *state == SafetyState::Connected && quality.is_lost() {
            *state = SafetyState::NotConnected;
            log::warn!("safety: radio link lost, track degraded to NotConnected");
            drop(state);
            self.link_subscribers.notify(SafetyState::NotConnected);
        }
    }

    /// Subscribe to GPS track state changes.
    pub fn subscribe_gps_state<F>(&self, callback: F) -> Subscription
    where
        F: Fn(SafetyState) + Send + 'static,
    {
        self.gps_subscribers.subscribe(callback)
    }

    /// Subscribe to link track state changes.
    pub fn subscribe_link_state<F>(&self, callback: F) -> Subscription
    where
        F: Fn(SafetyState) + Send + 'static,
    {
        self.link_subscribers.subscribe(callback)
    }

    /// The GPS track's current state.
    pub fn current_gps_state(&self) -> SafetyState {
        *self.gps_state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The link track's current state.
    pub fn current_link_state(&self) -> SafetyState {
        *self.link_state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex as StdMutex};

    #[test]
    fn gps_degradation_is_one_way() {
        let sm = SafetyStateMachine::new();
        let events = Arc::new(StdMutex::new(Vec::new()));
        let e = Arc::clone(&events);
        let _sub = sm.subscribe_gps_state(move |s| e.lock().unwrap().push(s));

        assert_eq!(sm.current_gps_state(), SafetyState::GpsHealthy);

        sm.handle_gps_signal(SignalQuality::Good);
        sm.handle_gps_signal(SignalQuality::NoSignal);
        sm.handle_gps_signal(SignalQuality::Excellent);

        assert_eq!(sm.current_gps_state(), SafetyState::GpsNotHealthy);
        assert_eq!(*events.lock().unwrap(), vec![SafetyState::GpsNotHealthy]);
    }

    #[test]
    fn link_degradation_is_one_way() {
        let sm = SafetyStateMachine::new();
        assert_eq!(sm.current_link_state(), SafetyState::Connected);

        sm.handle_link_signal(SignalQuality::NoSignal);
        assert_eq!(sm.current_link_state(), SafetyState::NotConnected);

        sm.handle_link_signal(SignalQuality::Excellent);
        assert_eq!(sm.current_link_state(), SafetyState::NotConnected);
    }

    #[test]
    fn repeated_no_signal_emits_event_once() {
        let sm = SafetyStateMachine::new();
        let count = Arc::new(StdMutex::new(0));
        let c = Arc::clone(&count);
        let _sub = sm.subscribe_gps_state(move |_| *c.lock().unwrap() += 1);

        sm.handle_gps_signal(SignalQuality::NoSignal);
        sm.handle_gps_signal(SignalQuality::NoSignal);
        sm.handle_gps_signal(SignalQuality::NoSignal);

        assert_eq!(*count.lock().unwrap(), 1);
    }

    #[test]
    fn good_samples_while_healthy_are_no_ops() {
        let sm = SafetyStateMachine::new();
        let count = Arc::new(StdMutex::new(0));
        let c = Arc::clone(&count);
        let _sub = sm.subscribe_gps_state(move |_| *c.lock().unwrap() += 1);

        for q in [
            SignalQuality::Poor,
            SignalQuality::Fair,
            SignalQuality::Good,
            SignalQuality::Excellent,
        ] {
            sm.handle_gps_signal(q);
        }

        assert_eq!(*count.lock().unwrap(), 0);
        assert_eq!(sm.current_gps_state(), SafetyState::GpsHealthy);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn quality_strategy() -> impl Strategy<Value = SignalQuality> {
        prop_oneof![
            Just(SignalQuality::NoSignal),
            Just(SignalQuality::Poor),
            Just(SignalQuality::Fair),
            Just(SignalQuality::Good),
            Just(SignalQuality::Excellent),
        ]
    }

    proptest! {
        /// Invariant 1: once NoSignal has been observed, every subsequent
        /// read of current_gps_state() returns GpsNotHealthy, no matter
        /// what arrives afterward.
        #[test]
        fn gps_track_never_recovers_after_loss(
            before in proptest::collection::vec(quality_strategy(), 0..20),
            after in proptest::collection::vec(quality_strategy(), 0..20),
        ) {
            let sm = SafetyStateMachine::new();
            for q in before {
                sm.handle_gps_signal(q);
            }
            sm.handle_gps_signal(SignalQuality::NoSignal);
            for q in after {
                sm.handle_gps_signal(q);
                prop_assert_eq!(sm.current_gps_state(), SafetyState::GpsNotHealthy);
            }
        }

        /// Invariant 2: same property for the link track.
        #[test]
        fn link_track_never_recovers_after_loss(
            after in proptest::collection::vec(quality_strategy(), 0..20),
        ) {
            let sm = SafetyStateMachine::new();
            sm.handle_link_signal(SignalQuality::NoSignal);
            for q in after {
                sm.handle_link_signal(q);
                prop_assert_eq!(sm.current_link_state(), SafetyState::NotConnected);
            }
        }
    }
}
