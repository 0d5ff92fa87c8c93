use pilot_assist::flight::SimConfig;
use pilot_assist::io::csv;
use pilot_assist::io::json::{self, FlightSummary};
use pilot_assist::sim::event::{EventDetector, HeadingCaptureDetector};
use pilot_assist::sim::{self, Scenario};
use pilot_assist::VehicleAutopilot;

fn main() {
    env_logger::init();

    // wraps through north: 300 -> 40 is a 100 deg right turn
    let scenario = Scenario::cruise(300.0, 1500.0, 100.0);
    let config = SimConfig { dt: 0.02, max_time: 90.0 };
    let start = scenario.initial.flight_state(scenario.origin_latitude);

    let mut autopilot = VehicleAutopilot::default();
    autopilot.hold_heading(40.0, &start);
    autopilot.hold_vertical_speed(0.0, &start);
    autopilot.hold_speed(100.0, &start);

    println!("Turning from 300 to 40 deg ...");
    let mut detectors: Vec<Box<dyn EventDetector>> = vec![Box::new(HeadingCaptureDetector::new(40.0, 2.0))];
    let result = sim::simulate(&scenario, &config, &mut autopilot, &mut detectors);

    let Some(summary) = FlightSummary::from_result("heading hold", &result) else {
        eprintln!("empty run");
        return;
    };
    for e in &summary.events {
        println!("t={:.1}s: {}", e.time_s, e.event);
    }
    println!("Final heading error: {:+.1} deg", summary.heading_error(40.0));
    println!("Altitude band: {:.0} .. {:.0} m", summary.min_altitude_m, summary.max_altitude_m);

    if let Err(e) = csv::write_telemetry_file("heading_change.csv", &result.states, &result.commands) {
        eprintln!("failed to write CSV: {}", e);
        return;
    }
    if let Err(e) = json::write_summary_file("heading_change.json", &summary) {
        eprintln!("failed to write JSON: {}", e);
        return;
    }
    println!("Exported: heading_change.csv, heading_change.json");
}
