//! Command state machine: owns the active mission, the destination, the
//! waypoint queue, and the command lifecycle (`Idle` / `Busy` /
//! `MissionAbort`).
//!
//! This is the busiest of the three machines: it is driven both by the
//! client (new missions) and by telemetry (GPS location updates, safety
//! state changes), and it is the only one of the three that owns mutable
//! domain data beyond its own status (the destination and the path queue).

use std::collections::VecDeque;
use std::sync::Mutex;

use drone_sdk_icd::{CommandStatus, CurrentMission, FlightControllerStatus, Location, SafetyState};

use crate::pubsub::{Subscribers, Subscription};

/// Internal events processed by the `Idle` / `Busy` / `MissionAbort` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Event {
    TaskAssigned,
    TaskCompleted,
    TaskAborted,
}

/// Apply the command lifecycle's transition table. Returns `None` for any
/// (state, event) pair that is not a defined transition — the caller treats
/// that as a no-op.
fn transition(state: CommandStatus, event: Event) -> Option<CommandStatus> {
    use CommandStatus::{Busy, Idle, MissionAbort};
    use Event::{TaskAborted, TaskAssigned, TaskCompleted};
    match (state, event) {
        (Idle, TaskAssigned) => Some(Busy),
        (Busy, TaskAssigned) => Some(Busy),
        (Busy, TaskCompleted) => Some(Idle),
        (Busy, TaskAborted) => Some(MissionAbort),
        (MissionAbort, TaskCompleted) => Some(Idle),
        _ => None,
    }
}

struct Inner {
    status: CommandStatus,
    mission: CurrentMission,
    current_location: Location,
    destination: Location,
    home: Location,
    path_queue: VecDeque<Location>,
}

/// One notification queued while the inner lock is held, fired after it is
/// released so a subscriber callback can safely call back into the state
/// machine without deadlocking.
enum Pending {
    Status(CommandStatus),
    Mission(CurrentMission),
    Destination(Location),
    /// A destination change the command controller must re-actuate on its
    /// own, with no paired explicit client call: a PATH mission advancing to
    /// its next waypoint, or a safety abort's descent-in-place. Distinct
    /// from `Destination` (which fires for every change, including the one
    /// `handle_task_assigned` itself already produces) so the controller's
    /// wiring doesn't re-send a command the two-phase admission/actuation
    /// call already issued.
    Reactuate(Location),
    Waypoint(Location),
    Takeoff(bool),
    Landing(bool),
}

/// The command state machine.
pub struct CommandStateMachine {
    inner: Mutex<Inner>,
    state_subscribers: Subscribers<CommandStatus>,
    mission_subscribers: Subscribers<CurrentMission>,
    destination_subscribers: Subscribers<Location>,
    reactuate_subscribers: Subscribers<Location>,
    waypoint_subscribers: Subscribers<Location>,
    takeoff_subscribers: Subscribers<bool>,
    landing_subscribers: Subscribers<bool>,
}

impl Default for CommandStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandStateMachine {
    /// Construct a new machine. Starts `Idle`, with home base and the
    /// current location both at the origin.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                status: CommandStatus::Idle,
                mission: CurrentMission::Landed,
                current_location: Location::ORIGIN,
                destination: Location::ORIGIN,
                home: Location::ORIGIN,
                path_queue: VecDeque::new(),
            }),
            state_subscribers: Subscribers::new(),
            mission_subscribers: Subscribers::new(),
            destination_subscribers: Subscribers::new(),
            reactuate_subscribers: Subscribers::new(),
            waypoint_subscribers: Subscribers::new(),
            takeoff_subscribers: Subscribers::new(),
            landing_subscribers: Subscribers::new(),
        }
    }

    /// Set the home base location. Owned exclusively by this machine.
    pub fn set_home(&self, home: Location) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.home = home;
    }

    /// The current home base location.
    pub fn home(&self) -> Location {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).home
    }

    /// The current command lifecycle status.
    pub fn current_state(&self) -> CommandStatus {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).status
    }

    /// The currently active mission type.
    pub fn current_mission(&self) -> CurrentMission {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).mission
    }

    /// The current destination.
    pub fn current_destination(&self) -> Location {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .destination
    }

    /// Subscribe to command lifecycle state changes.
    pub fn subscribe_state<F>(&self, callback: F) -> Subscription
    where
        F: Fn(CommandStatus) + Send + 'static,
    {
        self.state_subscribers.subscribe(callback)
    }

    /// Subscribe to mission-type changes.
    pub fn subscribe_mission<F>(&self, callback: F) -> Subscription
    where
        F: Fn(CurrentMission) + Send + 'static,
    {
        self.mission_subscribers.subscribe(callback)
    }

    /// Subscribe to destination changes. Fires for every destination change,
    /// including the one admission itself produces — intended for external
    /// observers (the client SDK, demos, tests), not for driving actuation.
    pub fn subscribe_destination<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Location) + Send + 'static,
    {
        self.destination_subscribers.subscribe(callback)
    }

    /// Subscribe to destination changes the command controller must
    /// re-actuate on its own: PATH waypoint advance and safety-abort
    /// descent. Does *not* fire for the destination an admitted mission
    /// starts with — that one is already actuated by the two-phase
    /// admission/execute call, and firing here too would re-send it.
    pub fn subscribe_reactuate<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Location) + Send + 'static,
    {
        self.reactuate_subscribers.subscribe(callback)
    }

    /// Subscribe to path-waypoint-reached events.
    pub fn subscribe_waypoint<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Location) + Send + 'static,
    {
        self.waypoint_subscribers.subscribe(callback)
    }

    /// Subscribe to takeoff-requested signals.
    pub fn subscribe_takeoff<F>(&self, callback: F) -> Subscription
    where
        F: Fn(bool) + Send + 'static,
    {
        self.takeoff_subscribers.subscribe(callback)
    }

    /// Subscribe to landing-requested signals.
    pub fn subscribe_landing<F>(&self, callback: F) -> Subscription
    where
        F: Fn(bool) + Send + 'static,
    {
        self.landing_subscribers.subscribe(callback)
    }

    /// Admit a new mission. `single` and `path` are mutually exclusive and
    /// each mission type requires exactly the argument it needs (see the
    /// match below); on rejection, no field of this machine changes and no
    /// event fires.
    pub fn handle_task_assigned(
        &self,
        mission: CurrentMission,
        single: Option<Location>,
        path: Option<VecDeque<Location>>,
    ) -> FlightControllerStatus {
        let mut pending = Vec::new();
        let result = {
            let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());

            if inner.status == CommandStatus::MissionAbort {
                log::warn!("command: rejected new task while a safety abort is in progress");
                return FlightControllerStatus::InvalidCommand;
            }

            if single.is_some() && path.is_some() {
                log::warn!("command: rejected task with both single and path destinations");
                return FlightControllerStatus::InvalidCommand;
            }

            match mission {
                CurrentMission::Goto if single.is_none() => {
                    return FlightControllerStatus::InvalidCommand;
                }
                CurrentMission::Path if path.as_ref().is_none_or_empty() => {
                    return FlightControllerStatus::InvalidCommand;
                }
                CurrentMission::Hover if single.is_some() || path.is_some() => {
                    return FlightControllerStatus::InvalidCommand;
                }
                CurrentMission::Landed => {
                    return FlightControllerStatus::InvalidCommand;
                }
                _ => {}
            }

            let Some(new_status) = transition(inner.status, Event::TaskAssigned) else {
                return FlightControllerStatus::InvalidCommand;
            };
            inner.status = new_status;
            pending.push(Pending::Status(new_status));

            inner.mission = mission;
            pending.push(Pending::Mission(mission));

            let landed = inner.current_location.altitude == inner.home.altitude;

            match mission {
                CurrentMission::Goto => {
                    // single checked above.
                    #[allow(clippy::unwrap_used)]
                    let dest = single.unwrap();
                    inner.destination = dest;
                    pending.push(Pending::Destination(dest));
                    if landed {
                        pending.push(Pending::Takeoff(true));
                    }
                }
                CurrentMission::Home => {
                    let dest = inner.home;
                    inner.destination = dest;
                    pending.push(Pending::Destination(dest));
                }
                CurrentMission::Hover => {
                    let dest = inner.current_location;
                    inner.destination = dest;
                    pending.push(Pending::Destination(dest));
                    if landed {
                        pending.push(Pending::Takeoff(true));
                    }
                    if let Some(done) = transition(inner.status, Event::TaskCompleted) {
                        inner.status = done;
                        pending.push(Pending::Status(done));
                    }
                }
                CurrentMission::Path => {
                    // path checked non-empty above.
                    #[allow(clippy::unwrap_used)]
                    let mut queue = path.unwrap();
                    #[allow(clippy::unwrap_used)]
                    let dest = queue.pop_front().unwrap();
                    inner.destination = dest;
                    inner.path_queue = queue;
                    pending.push(Pending::Destination(dest));
                }
                CurrentMission::Emergency => {
                    let dest = Location::new(
                        inner.current_location.latitude,
                        inner.current_location.longitude,
                        inner.home.altitude,
                    );
                    inner.destination = dest;
                    pending.push(Pending::Destination(dest));
                }
                CurrentMission::Landed => unreachable!("rejected above"),
            }

            log::info!("command: admitted mission {mission:?}, destination {:?}", inner.destination);
            FlightControllerStatus::Success
        };

        self.fire(pending);
        result
    }

    /// Feed one GPS location sample.
    pub fn handle_gps_location_update(&self, location: Location) {
        let mut pending = Vec::new();
        {
            let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            inner.current_location = location;

            if inner.current_location != inner.destination {
                self.fire(pending);
                return;
            }

            match inner.status {
                CommandStatus::Busy => match inner.mission {
                    CurrentMission::Goto => complete(&mut inner, &mut pending),
                    CurrentMission::Home => {
                        pending.push(Pending::Landing(true));
                        complete(&mut inner, &mut pending);
                    }
                    CurrentMission::Path => {
                        pending.push(Pending::Waypoint(inner.destination));
                        if let Some(next) = inner.path_queue.pop_front() {
                            inner.destination = next;
                            pending.push(Pending::Destination(next));
                            pending.push(Pending::Reactuate(next));
                        } else {
                            complete(&mut inner, &mut pending);
                        }
                    }
                    CurrentMission::Hover => {}
                    CurrentMission::Emergency => {
                        pending.push(Pending::Landing(true));
                        complete(&mut inner, &mut pending);
                    }
                    CurrentMission::Landed => {}
                },
                CommandStatus::MissionAbort => complete(&mut inner, &mut pending),
                CommandStatus::Idle => {}
            }
        }
        self.fire(pending);
    }

    /// React to a GPS safety-state change: triggers an abort when the GPS
    /// track has degraded.
    pub fn handle_gps_state_change(&self, state: SafetyState) {
        if state == SafetyState::GpsNotHealthy {
            self.abort_safety();
        }
    }

    /// React to a link safety-state change: triggers an abort when the
    /// link track has degraded.
    pub fn handle_link_state_change(&self, state: SafetyState) {
        if state == SafetyState::NotConnected {
            self.abort_safety();
        }
    }

    fn abort_safety(&self) {
        let mut pending = Vec::new();
        {
            let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            if inner.status != CommandStatus::Busy {
                self.fire(pending);
                return;
            }

            let dest = Location::new(
                inner.current_location.latitude,
                inner.current_location.longitude,
                inner.home.altitude,
            );
            inner.destination = dest;
            pending.push(Pending::Destination(dest));
            pending.push(Pending::Reactuate(dest));

            if let Some(aborted) = transition(inner.status, Event::TaskAborted) {
                inner.status = aborted;
                pending.push(Pending::Status(aborted));
                log::warn!("command: mission aborted for safety, descending to {dest:?}");
            }
        }
        self.fire(pending);
    }

    fn fire(&self, pending: Vec<Pending>) {
        for event in pending {
            match event {
                Pending::Status(s) => self.state_subscribers.notify(s),
                Pending::Mission(m) => self.mission_subscribers.notify(m),
                Pending::Destination(l) => self.destination_subscribers.notify(l),
                Pending::Reactuate(l) => self.reactuate_subscribers.notify(l),
                Pending::Waypoint(l) => self.waypoint_subscribers.notify(l),
                Pending::Takeoff(b) => self.takeoff_subscribers.notify(b),
                Pending::Landing(b) => self.landing_subscribers.notify(b),
            }
        }
    }
}

fn complete(inner: &mut Inner, pending: &mut Vec<Pending>) {
    if let Some(next) = transition(inner.status, Event::TaskCompleted) {
        inner.status = next;
        pending.push(Pending::Status(next));
    }
}

trait NoneOrEmpty {
    fn is_none_or_empty(&self) -> bool;
}

impl NoneOrEmpty for Option<&VecDeque<Location>> {
    fn is_none_or_empty(&self) -> bool {
        match self {
            None => true,
            Some(q) => q.is_empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mission_abort_rejects_new_task_until_idle() {
        let csm = CommandStateMachine::new();

        let admitted = csm.handle_task_assigned(
            CurrentMission::Goto,
            Some(Location::new(1.0, 1.0, 10.0)),
            None,
        );
        assert_eq!(admitted, FlightControllerStatus::Success);
        assert_eq!(csm.current_state(), CommandStatus::Busy);

        csm.handle_gps_state_change(SafetyState::GpsNotHealthy);
        assert_eq!(csm.current_state(), CommandStatus::MissionAbort);
        let aborted_mission = csm.current_mission();
        let aborted_destination = csm.current_destination();

        let rejected = csm.handle_task_assigned(
            CurrentMission::Goto,
            Some(Location::new(2.0, 2.0, 20.0)),
            None,
        );

        assert_eq!(rejected, FlightControllerStatus::InvalidCommand);
        assert_eq!(csm.current_state(), CommandStatus::MissionAbort);
        assert_eq!(csm.current_mission(), aborted_mission);
        assert_eq!(csm.current_destination(), aborted_destination);
    }

    #[test]
    fn goto_missing_single_is_rejected_unchanged() {
        let csm = CommandStateMachine::new();

        let rejected = csm.handle_task_assigned(CurrentMission::Goto, None, None);

        assert_eq!(rejected, FlightControllerStatus::InvalidCommand);
        assert_eq!(csm.current_state(), CommandStatus::Idle);
        assert_eq!(csm.current_mission(), CurrentMission::Landed);
        assert_eq!(csm.current_destination(), Location::ORIGIN);
    }

    #[test]
    fn path_missing_queue_is_rejected_unchanged() {
        let csm = CommandStateMachine::new();

        let rejected_none = csm.handle_task_assigned(CurrentMission::Path, None, None);
        assert_eq!(rejected_none, FlightControllerStatus::InvalidCommand);

        let rejected_empty = csm.handle_task_assigned(CurrentMission::Path, None, Some(VecDeque::new()));
        assert_eq!(rejected_empty, FlightControllerStatus::InvalidCommand);

        assert_eq!(csm.current_state(), CommandStatus::Idle);
        assert_eq!(csm.current_mission(), CurrentMission::Landed);
    }

    #[test]
    fn hover_with_args_is_rejected_unchanged() {
        let csm = CommandStateMachine::new();

        let rejected = csm.handle_task_assigned(
            CurrentMission::Hover,
            Some(Location::new(1.0, 1.0, 10.0)),
            None,
        );

        assert_eq!(rejected, FlightControllerStatus::InvalidCommand);
        assert_eq!(csm.current_state(), CommandStatus::Idle);
        assert_eq!(csm.current_mission(), CurrentMission::Landed);
    }

    #[test]
    fn emergency_admission_descends_to_home_altitude_then_completes() {
        let csm = CommandStateMachine::new();
        csm.set_home(Location::new(0.0, 0.0, 50.0));

        let admitted = csm.handle_task_assigned(CurrentMission::Emergency, None, None);

        assert_eq!(admitted, FlightControllerStatus::Success);
        assert_eq!(csm.current_state(), CommandStatus::Busy);
        assert_eq!(csm.current_mission(), CurrentMission::Emergency);
        assert_eq!(csm.current_destination(), Location::new(0.0, 0.0, 50.0));

        csm.handle_gps_location_update(Location::new(0.0, 0.0, 50.0));

        assert_eq!(csm.current_state(), CommandStatus::Idle);
    }

    #[test]
    fn admission_does_not_reactuate_but_progression_does() {
        use std::sync::{Arc, Mutex as StdMutex};

        let csm = CommandStateMachine::new();
        let reactuated = Arc::new(StdMutex::new(Vec::new()));
        let r = Arc::clone(&reactuated);
        #[allow(clippy::unwrap_used)]
        let _sub = csm.subscribe_reactuate(move |l| r.lock().unwrap().push(l));

        let queue = VecDeque::from(vec![
            Location::new(1.0, 1.0, 1.0),
            Location::new(2.0, 2.0, 2.0),
        ]);
        csm.handle_task_assigned(CurrentMission::Path, None, Some(queue));
        #[allow(clippy::unwrap_used)]
        {
            assert!(reactuated.lock().unwrap().is_empty());
        }

        csm.handle_gps_location_update(Location::new(1.0, 1.0, 1.0));
        #[allow(clippy::unwrap_used)]
        {
            assert_eq!(*reactuated.lock().unwrap(), vec![Location::new(2.0, 2.0, 2.0)]);
        }
    }

    #[test]
    fn safety_abort_reactuates_descent_destination() {
        use std::sync::{Arc, Mutex as StdMutex};

        let csm = CommandStateMachine::new();
        let reactuated = Arc::new(StdMutex::new(Vec::new()));
        let r = Arc::clone(&reactuated);
        #[allow(clippy::unwrap_used)]
        let _sub = csm.subscribe_reactuate(move |l| r.lock().unwrap().push(l));

        csm.set_home(Location::new(0.0, 0.0, 5.0));
        csm.handle_task_assigned(CurrentMission::Goto, Some(Location::new(9.0, 9.0, 90.0)), None);
        csm.handle_gps_location_update(Location::new(3.0, 3.0, 30.0));
        csm.handle_gps_state_change(SafetyState::GpsNotHealthy);

        #[allow(clippy::unwrap_used)]
        {
            assert_eq!(*reactuated.lock().unwrap(), vec![Location::new(3.0, 3.0, 5.0)]);
        }
    }
}
