//! Cascaded attitude and flight-path control with a stability assist.
//!
//! The [`autopilot::VehicleAutopilot`] reads a [`flight::FlightState`] and
//! pilot input every tick and returns a [`flight::ControlCommand`]. The
//! [`sim`] module closes the loop around a small fixed-wing model.

pub mod angle;
pub mod autopilot;
pub mod config;
pub mod error;
pub mod flight;
mod gnc_mod;
pub mod io;
pub mod presets;
pub mod sim;

// The gnc module: expose gnc_mod as `gnc` publicly
pub mod gnc {
    pub use crate::gnc_mod::*;
}

pub use autopilot::{Authority, VehicleAutopilot};
pub use config::{AutopilotConfig, Thresholds};
pub use flight::{ControlCommand, FlightState, PilotInput};
