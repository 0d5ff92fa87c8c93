use nalgebra::UnitQuaternion;

use crate::flight::ControlCommand;
use super::plant::{derivatives, AircraftParams, AircraftState};

// ---------------------------------------------------------------------------
// RK4 integrator with constant control command over the step
// ---------------------------------------------------------------------------

/// Single RK4 step with the command held constant over the step.
pub fn rk4_step(state: &AircraftState, params: &AircraftParams, cmd: &ControlCommand, dt: f64) -> AircraftState {
    let k1 = derivatives(state, params, cmd);
    let k2 = derivatives(&state.apply(&k1, dt * 0.5), params, cmd);
    let k3 = derivatives(&state.apply(&k2, dt * 0.5), params, cmd);
    let k4 = derivatives(&state.apply(&k3, dt), params, cmd);

    let new_quat_raw = state.quat.quaternion()
        + (k1.dquat + k2.dquat * 2.0 + k3.dquat * 2.0 + k4.dquat) * (dt / 6.0);

    AircraftState {
        time: state.time + dt,
        pos: state.pos + (k1.dpos + 2.0 * k2.dpos + 2.0 * k3.dpos + k4.dpos) * (dt / 6.0),
        vel: state.vel + (k1.dvel + 2.0 * k2.dvel + 2.0 * k3.dvel + k4.dvel) * (dt / 6.0),
        quat: UnitQuaternion::new_normalize(new_quat_raw),
        omega: state.omega
            + (k1.domega + 2.0 * k2.domega + 2.0 * k3.domega + k4.domega) * (dt / 6.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::plant::G0;
    use approx::assert_abs_diff_eq;
    use nalgebra::Vector3;

    #[test]
    fn constant_roll_rate_integrates_to_bank() {
        // zero damping and authority: the body just spins at the initial rate
        let params = AircraftParams {
            rate_damping: Vector3::zeros(),
            pitch_stability: 0.0,
            weathervane: 0.0,
            ..AircraftParams::default()
        };
        let mut s = AircraftState::cruise(0.0, 1000.0, 0.0, &params);
        s.omega = Vector3::new(0.5, 0.0, 0.0);
        let start = s.quat;
        for _ in 0..100 {
            s = rk4_step(&s, &params, &ControlCommand::default(), 0.01);
        }
        assert_abs_diff_eq!(s.quat.angle_to(&start), 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(s.quat.quaternion().norm(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn free_fall_matches_gravity() {
        let params = AircraftParams::default();
        let s = AircraftState::cruise(0.0, 1000.0, 0.0, &params);
        let s = rk4_step(&s, &params, &ControlCommand::default(), 1.0);
        // lift and drag stay small at free-fall speeds
        assert!((s.vel.z + G0).abs() < 0.5);
        assert_abs_diff_eq!(s.time, 1.0);
    }
}
