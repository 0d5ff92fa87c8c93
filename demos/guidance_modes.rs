use pilot_assist::flight::{FlightState, PilotInput, SimConfig};
use pilot_assist::gnc::{attitude_error, target_direction, target_orientation, GuidanceMode};
use pilot_assist::sim::{self, Scenario};
use pilot_assist::VehicleAutopilot;

/// Fly each vector guidance mode hands-off from level cruise and report how
/// close the nose ends up to the mode's direction.
fn main() {
    env_logger::init();

    let scenario = Scenario::cruise(30.0, 3000.0, 100.0);
    let config = SimConfig { dt: 0.02, max_time: 10.0 };
    let start = scenario.initial.flight_state(scenario.origin_latitude);

    println!("  {:<12} {:>14} {:>14} {:>12}", "mode", "initial (deg)", "final (deg)", "max bank");
    for mode in [GuidanceMode::Prograde, GuidanceMode::RadialOut, GuidanceMode::Normal] {
        let mut autopilot = VehicleAutopilot::default();
        autopilot.toggle_assist(&start);
        autopilot.set_guidance_mode(mode, &start);

        let mut hands_off = |_: &FlightState| PilotInput { throttle: 0.6, ..PilotInput::default() };
        let result = sim::simulate_with(&scenario, &config, &mut autopilot, &mut hands_off, &mut []);

        let Some(last) = result.last_state() else { continue };
        let max_bank = result.states.iter().map(|s| s.roll.abs()).fold(0.0_f64, f64::max);
        println!(
            "  {:<12} {:>14.1} {:>14.1} {:>12.1}",
            mode.name(),
            pointing_error(mode, &start),
            pointing_error(mode, last),
            max_bank
        );
    }
}

/// Angle between the nose and where `mode` wants it, degrees.
fn pointing_error(mode: GuidanceMode, state: &FlightState) -> f64 {
    match target_orientation(mode, state, 0.0) {
        Some(target) => {
            let e = attitude_error(state, &target);
            e.y.hypot(e.z)
        }
        None => target_direction(mode, state)
            .map_or(f64::NAN, |d| state.forward().angle(&d).to_degrees()),
    }
}
