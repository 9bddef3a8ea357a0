//! State machine manager: the central event router. Owns the three state
//! machines, wires their cross-machine coupling at construction time, and
//! is the single entry point telemetry and client commands flow through.

use std::collections::VecDeque;
use std::sync::Arc;

use drone_sdk_icd::{
    CommandStatus, CurrentMission, FlightControllerStatus, FlightState, Location, SafetyState,
    SignalQuality,
};

use crate::command_state_machine::CommandStateMachine;
use crate::flight_state_machine::FlightStateMachine;
use crate::pubsub::{Subscribers, Subscription};
use crate::safety_state_machine::SafetyStateMachine;

/// Wires the Safety, Command, and Flight state machines together and
/// exposes the full telemetry-in / subscription-out surface.
///
/// The three machines are held behind `Arc` so the cross-machine wiring
/// (SSM → CSM, CSM → FSM) established in [`StateMachineManager::new`] can
/// capture a clone of the target machine's `Arc` inside a subscriber
/// closure — the closure keeps that machine alive independent of wherever
/// `self` itself ends up living or moving to.
pub struct StateMachineManager {
    safety: Arc<SafetyStateMachine>,
    command: Arc<CommandStateMachine>,
    flight: Arc<FlightStateMachine>,
    gps_location_subscribers: Subscribers<(Location, SignalQuality)>,
    link_quality_subscribers: Subscribers<SignalQuality>,
    // Kept alive for the manager's lifetime; dropping these would silently
    // sever the SSM→CSM and CSM→FSM wiring.
    _wiring: Vec<Subscription>,
}

impl StateMachineManager {
    /// Construct a manager with all three machines in their initial state
    /// and the cross-machine wiring already established.
    pub fn new() -> Self {
        let safety = Arc::new(SafetyStateMachine::new());
        let command = Arc::new(CommandStateMachine::new());
        let flight = Arc::new(FlightStateMachine::new());

        let wiring = vec![
            Self::wire_gps_state(&safety, &command),
            Self::wire_link_state(&safety, &command),
            Self::wire_command_state(&command, &flight),
            Self::wire_mission(&command, &flight),
        ];

        Self {
            safety,
            command,
            flight,
            gps_location_subscribers: Subscribers::new(),
            link_quality_subscribers: Subscribers::new(),
            _wiring: wiring,
        }
    }

    fn wire_gps_state(
        safety: &Arc<SafetyStateMachine>,
        command: &Arc<CommandStateMachine>,
    ) -> Subscription {
        let command = Arc::clone(command);
        safety.subscribe_gps_state(move |state| command.handle_gps_state_change(state))
    }

    fn wire_link_state(
        safety: &Arc<SafetyStateMachine>,
        command: &Arc<CommandStateMachine>,
    ) -> Subscription {
        let command = Arc::clone(command);
        safety.subscribe_link_state(move |state| command.handle_link_state_change(state))
    }

    fn wire_command_state(
        command: &Arc<CommandStateMachine>,
        flight: &Arc<FlightStateMachine>,
    ) -> Subscription {
        let flight = Arc::clone(flight);
        command.subscribe_state(move |status| flight.handle_command_state_change(status))
    }

    fn wire_mission(
        command: &Arc<CommandStateMachine>,
        flight: &Arc<FlightStateMachine>,
    ) -> Subscription {
        let flight = Arc::clone(flight);
        command.subscribe_mission(move |mission| flight.handle_new_mission(mission))
    }

    /// Feed one GPS sample: forwards to external subscribers, the safety
    /// track, and the command state machine's location update, in that
    /// order.
    pub fn handle_gps_update(&self, location: Location, quality: SignalQuality) {
        self.gps_location_subscribers.notify((location, quality));
        self.safety.handle_gps_signal(quality);
        self.command.handle_gps_location_update(location);
    }

    /// Feed one radio link sample: forwards to external subscribers and the
    /// safety track, in that order.
    pub fn handle_link_update(&self, quality: SignalQuality) {
        self.link_quality_subscribers.notify(quality);
        self.safety.handle_link_signal(quality);
    }

    /// Submit a new mission. Delegates admission to the command state
    /// machine; on success the mission-type and state-change wiring drives
    /// the flight state machine automatically.
    pub fn new_task(
        &self,
        mission: CurrentMission,
        single: Option<Location>,
        path: Option<VecDeque<Location>>,
    ) -> FlightControllerStatus {
        self.command.handle_task_assigned(mission, single, path)
    }

    /// Set the home base location.
    pub fn set_home(&self, home: Location) {
        self.command.set_home(home);
    }

    /// The current home base location.
    pub fn get_home(&self) -> Location {
        self.command.home()
    }

    /// The command state machine's current destination.
    pub fn current_destination(&self) -> Location {
        self.command.current_destination()
    }

    /// The current flight phase.
    pub fn current_flight_state(&self) -> FlightState {
        self.flight.current_state()
    }

    /// The current command lifecycle status.
    pub fn current_command_state(&self) -> CommandStatus {
        self.command.current_state()
    }

    /// The GPS safety track's current state.
    pub fn current_gps_safety_state(&self) -> SafetyState {
        self.safety.current_gps_state()
    }

    /// The link safety track's current state.
    pub fn current_link_safety_state(&self) -> SafetyState {
        self.safety.current_link_state()
    }

    /// Subscribe to flight-state transitions.
    pub fn subscribe_flight_state<F>(&self, callback: F) -> Subscription
    where
        F: Fn(FlightState) + Send + 'static,
    {
        self.flight.subscribe_state(callback)
    }

    /// Subscribe to command lifecycle state changes.
    pub fn subscribe_command_state<F>(&self, callback: F) -> Subscription
    where
        F: Fn(CommandStatus) + Send + 'static,
    {
        self.command.subscribe_state(callback)
    }

    /// Subscribe to GPS safety-track changes.
    pub fn subscribe_gps_safety_state<F>(&self, callback: F) -> Subscription
    where
        F: Fn(SafetyState) + Send + 'static,
    {
        self.safety.subscribe_gps_state(callback)
    }

    /// Subscribe to link safety-track changes.
    pub fn subscribe_link_safety_state<F>(&self, callback: F) -> Subscription
    where
        F: Fn(SafetyState) + Send + 'static,
    {
        self.safety.subscribe_link_state(callback)
    }

    /// Subscribe to raw GPS location + quality samples.
    pub fn subscribe_gps_location<F>(&self, callback: F) -> Subscription
    where
        F: Fn((Location, SignalQuality)) + Send + 'static,
    {
        self.gps_location_subscribers.subscribe(callback)
    }

    /// Subscribe to raw radio link quality samples.
    pub fn subscribe_link_quality<F>(&self, callback: F) -> Subscription
    where
        F: Fn(SignalQuality) + Send + 'static,
    {
        self.link_quality_subscribers.subscribe(callback)
    }

    /// Subscribe to path-waypoint-reached events.
    pub fn subscribe_waypoint<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Location) + Send + 'static,
    {
        self.command.subscribe_waypoint(callback)
    }

    /// Subscribe to current-destination changes.
    pub fn subscribe_destination<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Location) + Send + 'static,
    {
        self.command.subscribe_destination(callback)
    }

    /// Subscribe to destination changes the command controller must
    /// re-actuate on its own (PATH waypoint advance, safety-abort descent).
    /// Not intended for client/demo observers — see
    /// [`CommandStateMachine::subscribe_reactuate`].
    pub fn subscribe_reactuate<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Location) + Send + 'static,
    {
        self.command.subscribe_reactuate(callback)
    }

    /// Subscribe to takeoff-requested signals.
    pub fn subscribe_takeoff<F>(&self, callback: F) -> Subscription
    where
        F: Fn(bool) + Send + 'static,
    {
        self.command.subscribe_takeoff(callback)
    }

    /// Subscribe to landing-requested signals.
    pub fn subscribe_landing<F>(&self, callback: F) -> Subscription
    where
        F: Fn(bool) + Send + 'static,
    {
        self.command.subscribe_landing(callback)
    }
}

impl Default for StateMachineManager {
    fn default() -> Self {
        Self::new()
    }
}
