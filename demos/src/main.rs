//! Minimal end-to-end demo of the drone application SDK against the mock
//! hardware facades: arms, flies to a destination, waits for arrival, flies
//! a short path, then shuts down cleanly.

use std::sync::Arc;
use std::time::Duration;

use drone_sdk_core::{DroneConfig, DroneSdk, MonitorConfig};
use drone_sdk_hw_sim::{JitteringGps, LoggingFlightController, ScriptedLink};
use drone_sdk_icd::{Location, SignalQuality};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let home = Location::ORIGIN;
    let gps = Arc::new(JitteringGps::new(home, 0.0, SignalQuality::Excellent));
    let link = ScriptedLink::steady(SignalQuality::Excellent);
    let flight_controller = LoggingFlightController::new();

    let config = DroneConfig {
        home,
        monitor: MonitorConfig {
            poll_interval: Duration::from_millis(100),
        },
    };

    let sdk = DroneSdk::new(DemoGps(Arc::clone(&gps)), link, flight_controller, config);

    let _flight_sub = sdk.subscribe_flight_state(|state| {
        log::info!("demo: flight state -> {state:?}");
    });
    let _command_sub = sdk.subscribe_command_state(|status| {
        log::info!("demo: command state -> {status:?}");
    });
    let _waypoint_sub = sdk.subscribe_waypoint(|loc| {
        log::info!("demo: waypoint reached -> {loc:?}");
    });

    let destination = Location::new(10.0, 20.0, 100.0);
    log::info!("demo: submitting go_to {destination:?}");
    let status = sdk.go_to(destination);
    log::info!("demo: go_to admitted with status {status:?}");

    std::thread::sleep(Duration::from_millis(150));
    gps.set_target(destination);
    std::thread::sleep(Duration::from_millis(300));

    log::info!("demo: submitting hover");
    let status = sdk.hover();
    log::info!("demo: hover admitted with status {status:?}");

    std::thread::sleep(Duration::from_millis(150));

    sdk.shutdown();
    log::info!("demo: shut down");

    Ok(())
}

/// Thin adapter so the demo can share one `JitteringGps` between `main`
/// (to move the jitter target) and the SDK (which takes ownership of its
/// `GpsSensor`).
struct DemoGps(Arc<JitteringGps>);

impl drone_sdk_icd::GpsSensor for DemoGps {
    fn location(&self) -> Location {
        self.0.location()
    }

    fn signal_quality(&self) -> SignalQuality {
        self.0.signal_quality()
    }
}
