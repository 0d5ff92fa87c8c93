use crate::autopilot::VehicleAutopilot;
use crate::flight::{ControlCommand, FlightState, PilotInput, SimConfig};
use crate::gnc::Controller;
use super::event::{EventDetector, SimEvent};
use super::integrator::rk4_step;
use super::plant::{AircraftParams, AircraftState};

// ---------------------------------------------------------------------------
// Scenario
// ---------------------------------------------------------------------------

/// Aircraft, initial condition and where on the globe it starts.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub params: AircraftParams,
    pub initial: AircraftState,
    pub origin_latitude: f64,
}

impl Scenario {
    /// Default aircraft in trimmed level flight.
    pub fn cruise(heading: f64, altitude: f64, speed: f64) -> Self {
        let params = AircraftParams::default();
        let initial = AircraftState::cruise(heading, altitude, speed, &params);
        Self {
            params,
            initial,
            origin_latitude: 0.0,
        }
    }

    pub fn with_latitude(mut self, latitude: f64) -> Self {
        self.origin_latitude = latitude;
        self
    }

    pub fn with_params(mut self, params: AircraftParams) -> Self {
        self.params = params;
        self
    }
}

/// Recorded run: one flight state and one command per tick, plus events.
#[derive(Debug, Clone, Default)]
pub struct SimResult {
    pub states: Vec<FlightState>,
    pub commands: Vec<ControlCommand>,
    pub events: Vec<SimEvent>,
}

impl SimResult {
    pub fn last_state(&self) -> Option<&FlightState> {
        self.states.last()
    }
}

// ---------------------------------------------------------------------------
// Closed-loop simulation
// ---------------------------------------------------------------------------

/// Fly `scenario` with a custom controller. `pilot` supplies the manual
/// input for each tick. Stops at `max_time` or on touchdown.
pub fn simulate_with(
    scenario: &Scenario,
    config: &SimConfig,
    controller: &mut dyn Controller,
    pilot: &mut dyn FnMut(&FlightState) -> PilotInput,
    detectors: &mut [Box<dyn EventDetector>],
) -> SimResult {
    let lat = scenario.origin_latitude;
    let mut aircraft = scenario.initial.clone();
    let mut state = aircraft.flight_state(lat);

    // fixed step count; accumulating dt into `time` drifts
    let steps = (config.max_time / config.dt).round() as usize;
    let cap = (steps + 1).min(200_000);
    let mut result = SimResult {
        states: Vec::with_capacity(cap),
        commands: Vec::with_capacity(cap),
        events: Vec::new(),
    };

    result.states.push(state.clone());
    result.commands.push(ControlCommand::default());

    log::debug!("simulating `{}` for {:.0} s", controller.name(), config.max_time);

    for _ in 0..steps {
        let input = pilot(&state);
        let cmd = controller.control(&state, &input, config.dt);

        aircraft = rk4_step(&aircraft, &scenario.params, &cmd, config.dt);

        // Ground contact
        let landed = aircraft.pos.z <= 0.0;
        if landed {
            aircraft.pos.z = 0.0;
        }

        let next = aircraft.flight_state(lat);
        for detector in detectors.iter_mut() {
            if let Some(kind) = detector.check(&state, &next) {
                log::info!("t={:.2}s: {}", next.time, kind);
                result.events.push(SimEvent { time: next.time, kind });
            }
        }

        result.states.push(next.clone());
        result.commands.push(cmd);
        state = next;

        if landed {
            break;
        }
    }

    result
}

/// Fly `scenario` under `autopilot` with hands off the stick at a fixed
/// cruise throttle (convenience wrapper).
pub fn simulate(
    scenario: &Scenario,
    config: &SimConfig,
    autopilot: &mut VehicleAutopilot,
    detectors: &mut [Box<dyn EventDetector>],
) -> SimResult {
    let mut hands_off = |_: &FlightState| PilotInput {
        throttle: 0.5,
        ..PilotInput::default()
    };
    simulate_with(scenario, config, autopilot, &mut hands_off, detectors)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
