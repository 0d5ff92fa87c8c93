pub mod event;
pub mod integrator;
pub mod plant;
pub mod runner;

pub use integrator::rk4_step;
pub use plant::{AircraftParams, AircraftState};
pub use runner::{simulate, simulate_with, Scenario, SimResult};
