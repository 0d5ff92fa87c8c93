use nalgebra::Vector3;

use pilot_assist::flight::{attitude_from_euler, ControlCommand, FlightState, PilotInput, SimConfig};
use pilot_assist::gnc::Controller;
use pilot_assist::sim::{self, AircraftParams, AircraftState, Scenario};

/// A bang-bang wing leveler: full aileron against any bank beyond the
/// deadband, nothing inside it. Pitch and throttle pass through.
struct BangBangLeveler {
    deadband: f64,
    authority: f64,
}

impl Controller for BangBangLeveler {
    fn control(&mut self, state: &FlightState, input: &PilotInput, _dt: f64) -> ControlCommand {
        // left wing down is positive bank; roll right to correct it
        let roll = if state.roll > self.deadband {
            self.authority
        } else if state.roll < -self.deadband {
            -self.authority
        } else {
            0.0
        };
        ControlCommand {
            roll,
            pitch: input.pitch.demand(),
            yaw: 0.0,
            throttle: input.throttle,
        }
    }

    fn name(&self) -> &str {
        "BangBang"
    }
}

fn main() {
    let params = AircraftParams::default();
    let mut initial = AircraftState::cruise(0.0, 1000.0, 100.0, &params);
    // start in a 30 deg left bank
    initial.quat = attitude_from_euler(0.0, params.trim_aoa.to_degrees(), 30.0, &Vector3::z(), &Vector3::y());
    let scenario = Scenario { params, initial, origin_latitude: 0.0 };
    let config = SimConfig { dt: 0.02, max_time: 30.0 };

    let mut controller = BangBangLeveler { deadband: 2.0, authority: 0.3 };
    let mut pilot = |_: &FlightState| PilotInput { throttle: 0.5, ..PilotInput::default() };

    println!("Simulating with {} controller...", controller.name());
    let result = sim::simulate_with(&scenario, &config, &mut controller, &mut pilot, &mut []);

    let switches = result
        .commands
        .windows(2)
        .filter(|w| w[0].roll != w[1].roll)
        .count();
    let last = result.last_state().map(|s| (s.time, s.roll, s.altitude)).unwrap_or_default();

    println!("Initial bank: {:+.1} deg", result.states[0].roll);
    println!("Final bank:   {:+.1} deg", last.1);
    println!("Final altitude: {:.0} m", last.2);
    println!("Aileron switches: {}", switches);
    println!("Flight time: {:.1} s", last.0);
}
