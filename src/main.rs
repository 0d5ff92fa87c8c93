use pilot_assist::config::AutopilotConfig;
use pilot_assist::flight::{AxisInput, FlightState, KeyEvents, PilotInput, SimConfig};
use pilot_assist::io::json::FlightSummary;
use pilot_assist::sim::event::{AltitudeDetector, EventDetector, HeadingCaptureDetector, TouchdownDetector};
use pilot_assist::sim::{self, Scenario, SimResult};
use pilot_assist::VehicleAutopilot;

const TARGET_HEADING: f64 = 90.0;
const TARGET_ALTITUDE: f64 = 1200.0;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Optional tuning document as the first argument
    let config = match std::env::args().nth(1) {
        Some(path) => match AutopilotConfig::from_file(&path) {
            Ok(config) => {
                log::info!("loaded configuration from {}", path);
                config
            }
            Err(e) => {
                log::warn!("{}: {}, using defaults", path, e);
                AutopilotConfig::default()
            }
        },
        None => AutopilotConfig::default(),
    };

    let scenario = Scenario::cruise(0.0, 1000.0, 100.0).with_latitude(45.0);
    let sim_config = SimConfig { dt: 0.02, max_time: 90.0 };

    // -----------------------------------------------------------------------
    // Run 1: autopilot turns onto a new heading and climbs
    // -----------------------------------------------------------------------
    let mut autopilot = VehicleAutopilot::new(config.clone());
    let start = scenario.initial.flight_state(scenario.origin_latitude);
    autopilot.hold_heading(TARGET_HEADING, &start);
    autopilot.hold_altitude(TARGET_ALTITUDE, &start);
    autopilot.hold_speed(100.0, &start);

    let mut detectors: Vec<Box<dyn EventDetector>> = vec![
        Box::new(HeadingCaptureDetector::new(TARGET_HEADING, 2.0)),
        Box::new(AltitudeDetector::new(TARGET_ALTITUDE - 10.0, true)),
        Box::new(TouchdownDetector),
    ];
    let autopilot_run = sim::simulate(&scenario, &sim_config, &mut autopilot, &mut detectors);

    // -----------------------------------------------------------------------
    // Run 2: stability assist holds attitude around a pilot roll input
    // -----------------------------------------------------------------------
    let mut assisted = VehicleAutopilot::new(config);
    let mut pilot = |s: &FlightState| {
        let rolling = (2.0..4.0).contains(&s.time);
        PilotInput {
            roll: AxisInput::analog(if rolling { 0.5 } else { 0.0 }),
            throttle: 0.5,
            keys: KeyEvents {
                assist_toggle: s.time < 1e-9,
                ..KeyEvents::default()
            },
            ..PilotInput::default()
        }
    };
    let assist_config = SimConfig { dt: 0.02, max_time: 20.0 };
    let assist_run = sim::simulate_with(&scenario, &assist_config, &mut assisted, &mut pilot, &mut []);

    // -----------------------------------------------------------------------
    // Print results
    // -----------------------------------------------------------------------
    println!();
    println!("====================================================================");
    println!("  PILOT ASSIST: scripted flight report");
    println!("====================================================================");
    println!();
    println!("  Autopilot: heading {:.0} deg, altitude {:.0} m, speed 100 m/s", TARGET_HEADING, TARGET_ALTITUDE);
    println!("  ──────────────────────────────────────────────────────────────────");
    print_events(&autopilot_run);
    print_table(&autopilot_run, 10.0);
    if let Some(summary) = FlightSummary::from_result("autopilot", &autopilot_run) {
        println!(
            "  Final heading error {:+.1} deg, altitude {:.0} m, max bank {:.1} deg",
            summary.heading_error(TARGET_HEADING),
            summary.final_altitude_m,
            summary.max_bank_deg
        );
    }
    println!();

    println!("  Stability assist: roll right for 2 s, then release");
    println!("  ──────────────────────────────────────────────────────────────────");
    print_table(&assist_run, 1.0);
    if let Some(last) = assist_run.last_state() {
        println!(
            "  Held bank {:+.1} deg, authority {}",
            last.roll,
            assisted.authority().name()
        );
    }
    println!();
    println!(
        "  Simulation: {} + {} steps, dt={} s",
        autopilot_run.states.len(),
        assist_run.states.len(),
        sim_config.dt
    );
    println!("====================================================================");
    println!();
}

fn print_events(result: &SimResult) {
    if result.events.is_empty() {
        println!("  (no events)");
    }
    for e in &result.events {
        println!("  t={:>6.1}s   {}", e.time, e.kind);
    }
    println!();
}

/// Print a row roughly every `interval` seconds plus the final state.
fn print_table(result: &SimResult, interval: f64) {
    println!(
        "  {:>7}  {:>8}  {:>7}  {:>7}  {:>8}  {:>7}  {:>6}  {:>6}",
        "t (s)", "hdg", "pitch", "bank", "alt (m)", "vs", "ail", "elev"
    );
    let step = ((interval / (result.states.get(1).map_or(1.0, |s| s.time))).round() as usize).max(1);
    let last = result.states.len().saturating_sub(1);
    for (i, (s, c)) in result.states.iter().zip(&result.commands).enumerate() {
        if i % step != 0 && i != last {
            continue;
        }
        println!(
            "  {:>7.1}  {:>8.1}  {:>7.1}  {:>7.1}  {:>8.0}  {:>7.1}  {:>6.2}  {:>6.2}",
            s.time, s.heading, s.pitch, s.roll, s.altitude, s.vertical_speed, c.roll, c.pitch
        );
    }
}
