use crate::flight::{ControlCommand, FlightState, PilotInput};

/// Trait for flight controllers.
///
/// Implement this to plug a custom controller into the simulation loop in
/// place of [`VehicleAutopilot`](crate::autopilot::VehicleAutopilot).
pub trait Controller {
    /// Compute this tick's command from the flight state and pilot input.
    fn control(&mut self, state: &FlightState, input: &PilotInput, dt: f64) -> ControlCommand;

    /// Reset controller internal state (e.g., PID integrators).
    fn reset(&mut self) {}

    /// Human-readable name for logging/display.
    fn name(&self) -> &str {
        "unnamed"
    }
}

/// Pilot input passed straight through; the open-loop baseline.
#[derive(Debug, Clone, Copy, Default)]
pub struct Manual;

impl Controller for Manual {
    fn control(&mut self, _state: &FlightState, input: &PilotInput, _dt: f64) -> ControlCommand {
        ControlCommand {
            roll: input.roll.demand(),
            pitch: input.pitch.demand(),
            yaw: input.yaw.demand(),
            throttle: input.throttle,
        }
        .clamped()
    }

    fn name(&self) -> &str {
        "Manual"
    }
}
