pub mod frames;
pub mod input;
pub mod state;

pub use frames::{attitude_from_axes, attitude_from_euler, Kinematics};
pub use input::{AxisInput, KeyEvents, PilotInput, DEFAULT_DEADBAND};
pub use state::{ControlCommand, FlightState, SimConfig};
