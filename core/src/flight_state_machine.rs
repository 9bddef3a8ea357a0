//! Flight state machine: owns the physical flight phase and reacts only to
//! command-state changes and mission-type changes — never to raw telemetry.

use std::sync::Mutex;

use drone_sdk_icd::{CommandStatus, CurrentMission, FlightState};

use crate::pubsub::{Subscribers, Subscription};

/// Internal transition-table events. Distinct from [`FlightState`] itself —
/// several rows target the same state through different named events (e.g.
/// both `Takeoff`→`Hover` and `Airborne`→`Hover` land on `Hover`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Event {
    Takeoff,
    Airborne,
    Hover,
    TaskComplete,
    ReturnHome,
    Land,
    SafetyViolation,
}

fn raw_transition(state: FlightState, event: Event) -> Option<FlightState> {
    use Event::{Airborne, Hover, Land, ReturnHome, SafetyViolation, TaskComplete, Takeoff};
    use FlightState::{EmergencyLand, Hover as HoverState, Landed, ReturnHome as ReturnHomeState};
    use FlightState::{Airborne as AirborneState, Takeoff as TakeoffState};

    if event == SafetyViolation {
        return match state {
            Landed | TakeoffState | AirborneState | HoverState | ReturnHomeState => {
                Some(EmergencyLand)
            }
            EmergencyLand => None,
        };
    }

    match (state, event) {
        (Landed, Takeoff) => Some(TakeoffState),
        (TakeoffState, Airborne) => Some(AirborneState),
        (TakeoffState, Hover) => Some(HoverState),
        (AirborneState, Hover) => Some(HoverState),
        (HoverState, Airborne) => Some(AirborneState),
        (AirborneState, TaskComplete) => Some(HoverState),
        (AirborneState, ReturnHome) => Some(ReturnHomeState),
        (ReturnHomeState, Land) => Some(Landed),
        _ => None,
    }
}

/// The flight state machine.
pub struct FlightStateMachine {
    state: Mutex<FlightState>,
    subscribers: Subscribers<FlightState>,
}

impl Default for FlightStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl FlightStateMachine {
    /// Construct a new machine, starting `Landed`.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FlightState::Landed),
            subscribers: Subscribers::new(),
        }
    }

    /// The current physical flight phase.
    pub fn current_state(&self) -> FlightState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Subscribe to flight-state transitions.
    pub fn subscribe_state<F>(&self, callback: F) -> Subscription
    where
        F: Fn(FlightState) + Send + 'static,
    {
        self.subscribers.subscribe(callback)
    }

    /// Derive an FSM trigger from a command-state change.
    pub fn handle_command_state_change(&self, status: CommandStatus) {
        match status {
            CommandStatus::Idle => self.apply_trigger(Event::Hover),
            CommandStatus::Busy => self.apply_trigger(Event::Airborne),
            CommandStatus::MissionAbort => self.apply_trigger(Event::SafetyViolation),
        }
    }

    /// Derive an FSM trigger from a newly admitted mission type.
    pub fn handle_new_mission(&self, mission: CurrentMission) {
        match mission {
            CurrentMission::Landed => self.apply_trigger(Event::Land),
            CurrentMission::Goto | CurrentMission::Path => self.apply_trigger(Event::Airborne),
            CurrentMission::Hover => self.apply_trigger(Event::Hover),
            CurrentMission::Home => self.apply_trigger(Event::ReturnHome),
            CurrentMission::Emergency => self.apply_trigger(Event::SafetyViolation),
        }
    }

    /// Fire the table's `TaskComplete` row directly. Not reachable from the
    /// command-state or mission-type derivations above; kept for parity
    /// with the full transition table.
    pub fn handle_task_complete(&self) {
        self.apply_trigger(Event::TaskComplete);
    }

    fn apply_trigger(&self, event: Event) {
        let mut pending = Vec::new();
        {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

            if *state == FlightState::Landed && matches!(event, Event::Airborne | Event::Hover) {
                if let Some(next) = raw_transition(*state, Event::Takeoff) {
                    *state = next;
                    pending.push(next);
                }
            }

            if let Some(next) = raw_transition(*state, event) {
                *state = next;
                pending.push(next);
            }
        }

        for state in pending {
            log::info!("flight: transitioned to {state:?}");
            self.subscribers.notify(state);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex as StdMutex};

    #[test]
    fn landed_busy_takes_off_and_becomes_airborne() {
        let fsm = FlightStateMachine::new();
        let events = Arc::new(StdMutex::new(Vec::new()));
        let e = Arc::clone(&events);
        let _sub = fsm.subscribe_state(move |s| e.lock().unwrap().push(s));

        fsm.handle_command_state_change(CommandStatus::Busy);

        assert_eq!(fsm.current_state(), FlightState::Airborne);
        assert_eq!(
            *events.lock().unwrap(),
            vec![FlightState::Takeoff, FlightState::Airborne]
        );
    }

    #[test]
    fn goto_completion_sequence_matches_s2() {
        let fsm = FlightStateMachine::new();
        fsm.handle_new_mission(CurrentMission::Goto);
        assert_eq!(fsm.current_state(), FlightState::Airborne);

        fsm.handle_command_state_change(CommandStatus::Idle);
        assert_eq!(fsm.current_state(), FlightState::Hover);
    }

    #[test]
    fn safety_violation_is_absorbing_until_land() {
        let fsm = FlightStateMachine::new();
        fsm.handle_command_state_change(CommandStatus::Busy);
        fsm.handle_command_state_change(CommandStatus::MissionAbort);
        assert_eq!(fsm.current_state(), FlightState::EmergencyLand);

        // No other trigger moves it out of EmergencyLand.
        fsm.handle_command_state_change(CommandStatus::Idle);
        assert_eq!(fsm.current_state(), FlightState::EmergencyLand);
    }

    #[test]
    fn home_mission_returns_home_then_lands() {
        let fsm = FlightStateMachine::new();
        fsm.handle_command_state_change(CommandStatus::Busy);
        fsm.handle_new_mission(CurrentMission::Home);
        assert_eq!(fsm.current_state(), FlightState::ReturnHome);
    }
}
